use crate::encode::ffmpeg::{
    StreamingEncoder, VideoCodec, is_ffmpeg_on_path, probe_video_encoders,
};
use crate::encode::gif::GifEncoder;
use crate::encode::recorder::RecordedEncoder;
use crate::encode::sink::FrameEncoder;
use crate::foundation::error::{MorphError, MorphResult};
use crate::model::slide::ExportFormat;
use std::collections::BTreeSet;

/// The encoder backend chosen once per export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncoderStrategy {
    /// Frames are piped to the encoder as they are captured.
    StreamingVideo(VideoCodec),
    /// Frames are recorded and muxed at finalize.
    RecordedVideo(VideoCodec),
    /// Batched GIF encoding.
    Gif,
}

impl EncoderStrategy {
    /// Short name used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Self::StreamingVideo(_) => "streaming",
            Self::RecordedVideo(_) => "recorded",
            Self::Gif => "gif",
        }
    }

    /// Upper bound for capture-phase progress, leaving headroom for finalize.
    pub fn capture_progress_cap(self) -> f64 {
        match self {
            Self::Gif => 0.9,
            Self::StreamingVideo(_) | Self::RecordedVideo(_) => 0.99,
        }
    }
}

/// Runtime encoder capabilities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderCapabilities {
    /// Whether `ffmpeg` could be executed.
    pub ffmpeg: bool,
    /// Video encoders `ffmpeg` reports.
    pub video_encoders: BTreeSet<String>,
}

impl EncoderCapabilities {
    /// Probe the system `ffmpeg` once.
    pub fn detect() -> Self {
        if !is_ffmpeg_on_path() {
            tracing::info!("ffmpeg not found on PATH; only gif export is available");
            return Self::default();
        }
        match probe_video_encoders() {
            Ok(video_encoders) => {
                tracing::debug!(encoders = video_encoders.len(), "ffmpeg encoders probed");
                Self {
                    ffmpeg: true,
                    video_encoders,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "ffmpeg encoder probe failed");
                Self {
                    ffmpeg: true,
                    video_encoders: BTreeSet::new(),
                }
            }
        }
    }

    /// Capabilities with `ffmpeg` present and the named encoders available.
    pub fn with_encoders<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ffmpeg: true,
            video_encoders: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Return `true` when `codec` can be used.
    pub fn supports(&self, codec: VideoCodec) -> bool {
        self.ffmpeg && self.video_encoders.contains(codec.encoder_name())
    }
}

/// Pick the encoder strategy for `format`.
///
/// MP4 prefers streaming H.264 and falls back to recorded MPEG-4; WebM is always recorded VP9;
/// GIF needs nothing from the runtime. Anything else is an [`MorphError::EncoderConfiguration`].
pub fn select_strategy(
    format: ExportFormat,
    caps: &EncoderCapabilities,
) -> MorphResult<EncoderStrategy> {
    match format {
        ExportFormat::Gif => Ok(EncoderStrategy::Gif),
        ExportFormat::Mp4 if caps.supports(VideoCodec::H264) => {
            Ok(EncoderStrategy::StreamingVideo(VideoCodec::H264))
        }
        ExportFormat::Mp4 if caps.supports(VideoCodec::Mpeg4) => {
            Ok(EncoderStrategy::RecordedVideo(VideoCodec::Mpeg4))
        }
        ExportFormat::Webm if caps.supports(VideoCodec::Vp9) => {
            Ok(EncoderStrategy::RecordedVideo(VideoCodec::Vp9))
        }
        ExportFormat::Mp4 | ExportFormat::Webm if !caps.ffmpeg => {
            Err(MorphError::encoder_configuration(format!(
                "{} export requires ffmpeg on PATH",
                format.extension()
            )))
        }
        ExportFormat::Mp4 => Err(MorphError::encoder_configuration(
            "ffmpeg has neither libx264 nor mpeg4 for mp4 export",
        )),
        ExportFormat::Webm => Err(MorphError::encoder_configuration(
            "ffmpeg has no libvpx-vp9 encoder for webm export",
        )),
    }
}

/// Creates the encoder for a chosen strategy.
pub trait EncoderProvider {
    /// Encoder capabilities used for strategy selection.
    fn capabilities(&self) -> MorphResult<EncoderCapabilities>;

    /// Build a fresh encoder for `strategy`.
    fn create(&self, strategy: EncoderStrategy) -> MorphResult<Box<dyn FrameEncoder>>;
}

/// Provider backed by the system `ffmpeg` and the built-in GIF encoder.
#[derive(Debug, Default)]
pub struct SystemEncoders {
    caps: std::sync::OnceLock<EncoderCapabilities>,
}

impl SystemEncoders {
    /// Provider that probes `ffmpeg` lazily, once.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EncoderProvider for SystemEncoders {
    fn capabilities(&self) -> MorphResult<EncoderCapabilities> {
        Ok(self.caps.get_or_init(EncoderCapabilities::detect).clone())
    }

    fn create(&self, strategy: EncoderStrategy) -> MorphResult<Box<dyn FrameEncoder>> {
        Ok(match strategy {
            EncoderStrategy::StreamingVideo(codec) => Box::new(StreamingEncoder::new(codec)),
            EncoderStrategy::RecordedVideo(codec) => Box::new(RecordedEncoder::new(codec)),
            EncoderStrategy::Gif => Box::new(GifEncoder::new()),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/strategy.rs"]
mod tests;
