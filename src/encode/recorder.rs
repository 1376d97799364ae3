use crate::encode::ffmpeg::{FfmpegProcess, VideoCodec, flatten_to_opaque_rgba8};
use crate::encode::sink::{Blob, EncodeConfig, FrameEncoder};
use crate::foundation::error::{MorphError, MorphResult};
use crate::render::backend::FrameRGBA;

/// Persistent output canvas of a [`RecordedEncoder`].
///
/// Captures are flattened onto the canvas background; captures of another size are resized
/// to fit.
#[derive(Clone, Debug)]
pub struct RecorderCanvas {
    image: image::RgbaImage,
    background: [u8; 4],
}

impl RecorderCanvas {
    /// Opaque canvas of `width`x`height` filled with `background`.
    pub fn new(width: u32, height: u32, background: [u8; 4]) -> Self {
        let [r, g, b, _] = background;
        Self {
            image: image::RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, 255])),
            background,
        }
    }

    /// Canvas size.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Current canvas pixels, opaque RGBA8.
    pub fn pixels(&self) -> &[u8] {
        &self.image
    }

    /// Draw `frame` over the whole canvas.
    pub fn draw(&mut self, frame: &FrameRGBA) -> MorphResult<()> {
        if frame.data.len() != frame.canvas().rgba_len() {
            return Err(MorphError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        let (width, height) = self.image.dimensions();
        if frame.width == width && frame.height == height {
            return flatten_to_opaque_rgba8(
                &mut self.image,
                &frame.data,
                frame.premultiplied,
                self.background,
            );
        }

        let mut flat = vec![0u8; frame.data.len()];
        flatten_to_opaque_rgba8(&mut flat, &frame.data, frame.premultiplied, self.background)?;
        let src = image::RgbaImage::from_raw(frame.width, frame.height, flat)
            .ok_or_else(|| MorphError::capture("captured frame has an invalid buffer"))?;
        self.image =
            image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle);
        Ok(())
    }
}

/// Fallback video encoder for runtimes without a streaming codec.
///
/// Every capture is drawn onto a persistent [`RecorderCanvas`] and the canvas is fed to a
/// recording `ffmpeg` as it arrives. Only one raw frame is held; the encoded stream accumulates
/// in the process output and is collected at [`FrameEncoder::finish`].
pub struct RecordedEncoder {
    codec: VideoCodec,
    cfg: Option<EncodeConfig>,
    canvas: Option<RecorderCanvas>,
    process: Option<FfmpegProcess>,
    frames: u64,
    last_ts: Option<u64>,
}

impl RecordedEncoder {
    /// Recorder muxing with `codec`. `ffmpeg` is spawned in [`FrameEncoder::begin`].
    pub fn new(codec: VideoCodec) -> Self {
        Self {
            codec,
            cfg: None,
            canvas: None,
            process: None,
            frames: 0,
            last_ts: None,
        }
    }

    /// Number of frames recorded so far.
    pub fn recorded_frames(&self) -> u64 {
        self.frames
    }

    /// Raw pixel bytes held by the encoder. Stays at one frame regardless of length.
    pub fn buffered_bytes(&self) -> usize {
        self.canvas.as_ref().map_or(0, |c| c.pixels().len())
    }
}

impl FrameEncoder for RecordedEncoder {
    fn begin(&mut self, cfg: EncodeConfig) -> MorphResult<()> {
        cfg.validate()?;
        self.abort();
        self.process = Some(FfmpegProcess::spawn(&cfg, self.codec)?);
        self.canvas = Some(RecorderCanvas::new(cfg.width, cfg.height, cfg.background));
        self.cfg = Some(cfg);
        self.frames = 0;
        self.last_ts = None;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_us: u64) -> MorphResult<()> {
        if self.cfg.is_none() {
            return Err(MorphError::encode("push_frame called before begin"));
        }
        if self.last_ts.is_some_and(|t| t >= timestamp_us) {
            return Err(MorphError::encode("timestamps must be strictly increasing"));
        }
        let (Some(canvas), Some(process)) = (self.canvas.as_mut(), self.process.as_mut()) else {
            return Err(MorphError::encode("recorder is already finalized"));
        };
        canvas.draw(frame)?;
        process.write(canvas.pixels())?;
        self.last_ts = Some(timestamp_us);
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self, progress: &mut dyn FnMut(f64)) -> MorphResult<Blob> {
        if self.cfg.take().is_none() {
            return Err(MorphError::encode("finish called before begin"));
        }
        self.canvas = None;
        let process = self
            .process
            .take()
            .ok_or_else(|| MorphError::encode("recorder is already finalized"))?;
        if self.frames == 0 {
            process.kill();
            return Err(MorphError::encode("no frames were recorded"));
        }
        tracing::debug!(
            codec = self.codec.encoder_name(),
            frames = self.frames,
            "stopping recorder"
        );
        let bytes = process.finish()?;
        progress(1.0);
        Ok(Blob::new(self.codec.mime_type(), bytes))
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.canvas = None;
        if let Some(process) = self.process.take() {
            process.kill();
        }
    }
}

impl Drop for RecordedEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/recorder.rs"]
mod tests;
