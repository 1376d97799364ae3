use crate::foundation::error::{MorphError, MorphResult};
use crate::model::slide::ExportFormat;
use crate::render::backend::FrameRGBA;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Encoded export output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    /// MIME type of `bytes`.
    pub mime: String,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Create a blob.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Return `true` when no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the blob to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> MorphResult<()> {
        use anyhow::Context as _;
        crate::encode::ffmpeg::ensure_parent_dir(path)?;
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        Ok(())
    }
}

/// Configuration handed to a [`FrameEncoder`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Target bitrate in bits per second (video only).
    pub bitrate: u32,
    /// Target container.
    pub format: ExportFormat,
    /// Opaque color translucent pixels are flattened onto.
    pub background: [u8; 4],
    /// GIF quantizer speed, 1 (best) to 30 (fastest).
    pub gif_speed: i32,
}

impl EncodeConfig {
    /// Validate dimensions and rates.
    pub fn validate(&self) -> MorphResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MorphError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(MorphError::validation("encode fps must be non-zero"));
        }
        if self.format != ExportFormat::Gif
            && (!self.width.is_multiple_of(2) || !self.height.is_multiple_of(2))
        {
            return Err(MorphError::validation(
                "encode width/height must be even (required for yuv420p video)",
            ));
        }
        if !(1..=30).contains(&self.gif_speed) {
            return Err(MorphError::validation("gif speed must be in 1..=30"));
        }
        Ok(())
    }

    /// Bytes in one tightly packed RGBA8 frame.
    pub fn frame_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }

    pub(crate) fn check_frame(&self, frame: &FrameRGBA) -> MorphResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(MorphError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.data.len() != self.frame_len() {
            return Err(MorphError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }
}

/// Encoder contract.
///
/// `push_frame` is called in strictly increasing timestamp order between one `begin` and one
/// `finish`. `abort` may be called instead of `finish` to discard partial output.
pub trait FrameEncoder {
    /// Prepare for a new stream.
    fn begin(&mut self, cfg: EncodeConfig) -> MorphResult<()>;

    /// Encode one captured frame presented at `timestamp_us`.
    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_us: u64) -> MorphResult<()>;

    /// Flush and return the encoded output. `progress` receives internal progress in `[0, 1]`.
    fn finish(&mut self, progress: &mut dyn FnMut(f64)) -> MorphResult<Blob>;

    /// Release resources without producing output.
    fn abort(&mut self) {}
}

/// A frame captured by [`InMemoryEncoder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Presentation timestamp.
    pub timestamp_us: u64,
    /// Pixels as pushed.
    pub frame: FrameRGBA,
}

/// Encoder that keeps frames in memory. Intended for tests and debugging.
#[derive(Clone, Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncodeConfig>,
    frames: Arc<Mutex<Vec<EncodedFrame>>>,
    finished: bool,
}

impl InMemoryEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the captured frames; stays valid after the encoder is moved.
    pub fn frames(&self) -> Arc<Mutex<Vec<EncodedFrame>>> {
        Arc::clone(&self.frames)
    }

    /// Configuration of the current stream.
    pub fn config(&self) -> Option<EncodeConfig> {
        self.cfg
    }

    fn lock(&self) -> MorphResult<std::sync::MutexGuard<'_, Vec<EncodedFrame>>> {
        self.frames
            .lock()
            .map_err(|_| MorphError::encode("in-memory frame store is poisoned"))
    }
}

impl FrameEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: EncodeConfig) -> MorphResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.finished = false;
        self.lock()?.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_us: u64) -> MorphResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| MorphError::encode("push_frame called before begin"))?;
        cfg.check_frame(frame)?;
        let mut frames = self.lock()?;
        if frames.last().is_some_and(|f| f.timestamp_us >= timestamp_us) {
            return Err(MorphError::encode("timestamps must be strictly increasing"));
        }
        frames.push(EncodedFrame {
            timestamp_us,
            frame: frame.clone(),
        });
        Ok(())
    }

    fn finish(&mut self, progress: &mut dyn FnMut(f64)) -> MorphResult<Blob> {
        let cfg = self
            .cfg
            .ok_or_else(|| MorphError::encode("finish called before begin"))?;
        if self.finished {
            return Err(MorphError::encode("encoder already finished"));
        }
        self.finished = true;
        let frames = self.lock()?;
        let mut bytes = Vec::with_capacity(frames.len() * cfg.frame_len());
        for f in frames.iter() {
            bytes.extend_from_slice(&f.frame.data);
        }
        progress(1.0);
        Ok(Blob::new(cfg.format.mime_type(), bytes))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
