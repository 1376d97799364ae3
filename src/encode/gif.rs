use crate::encode::ffmpeg::flatten_to_opaque_rgba8;
use crate::encode::sink::{Blob, EncodeConfig, FrameEncoder};
use crate::foundation::error::{MorphError, MorphResult};
use crate::model::slide::ExportFormat;
use crate::render::backend::FrameRGBA;
use gif::{Encoder, Frame, Repeat};
use rayon::prelude::*;

/// Frames buffered before a parallel quantization pass.
const QUANTIZE_BATCH: usize = 16;

/// Batched GIF encoder.
///
/// Frames are flattened and buffered as they arrive. Every [`QUANTIZE_BATCH`] frames the buffer
/// is palette-quantized in parallel and kept as indexed frames; [`FrameEncoder::finish`]
/// quantizes the remainder, then writes LZW data sequentially with progress reports.
#[derive(Debug, Default)]
pub struct GifEncoder {
    cfg: Option<EncodeConfig>,
    pending: Vec<(u64, Vec<u8>)>,
    quantized: Vec<(u64, Frame<'static>)>,
}

impl GifEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames pushed since [`FrameEncoder::begin`].
    pub fn frame_count(&self) -> usize {
        self.pending.len() + self.quantized.len()
    }

    fn last_timestamp(&self) -> Option<u64> {
        self.pending
            .last()
            .map(|(t, _)| *t)
            .or_else(|| self.quantized.last().map(|(t, _)| *t))
    }

    fn quantize_pending(&mut self, cfg: &EncodeConfig) {
        if self.pending.is_empty() {
            return;
        }
        let (w, h) = (cfg.width as u16, cfg.height as u16);
        let speed = cfg.gif_speed;
        let batch = std::mem::take(&mut self.pending);
        let frames: Vec<(u64, Frame<'static>)> = batch
            .into_par_iter()
            .map(|(ts, rgb)| (ts, Frame::from_rgb_speed(w, h, &rgb, speed)))
            .collect();
        self.quantized.extend(frames);
    }
}

/// Per-frame delays in centiseconds, derived from timestamps so rounding does not drift.
fn frame_delays(timestamps: &[u64], fps: u32) -> Vec<u16> {
    let cs = |us: u64| (us as f64 / 10_000.0).round() as i64;
    let nominal = (100.0 / f64::from(fps.max(1))).round().max(1.0) as i64;
    timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| {
            let d = timestamps
                .get(i + 1)
                .map_or(nominal, |&next| cs(next) - cs(ts));
            d.clamp(1, i64::from(u16::MAX)) as u16
        })
        .collect()
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

impl FrameEncoder for GifEncoder {
    fn begin(&mut self, cfg: EncodeConfig) -> MorphResult<()> {
        cfg.validate()?;
        if u16::try_from(cfg.width).is_err() || u16::try_from(cfg.height).is_err() {
            return Err(MorphError::encoder_configuration(format!(
                "gif frames are limited to 65535x65535, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        self.cfg = Some(cfg);
        self.pending.clear();
        self.quantized.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_us: u64) -> MorphResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| MorphError::encode("push_frame called before begin"))?;
        cfg.check_frame(frame)?;
        if self.last_timestamp().is_some_and(|t| t >= timestamp_us) {
            return Err(MorphError::encode("timestamps must be strictly increasing"));
        }
        let mut flat = vec![0u8; frame.data.len()];
        flatten_to_opaque_rgba8(&mut flat, &frame.data, frame.premultiplied, cfg.background)?;
        self.pending.push((timestamp_us, rgba_to_rgb(&flat)));
        if self.pending.len() >= QUANTIZE_BATCH {
            self.quantize_pending(&cfg);
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(frames = self.frame_count()))]
    fn finish(&mut self, progress: &mut dyn FnMut(f64)) -> MorphResult<Blob> {
        let cfg = self
            .cfg
            .ok_or_else(|| MorphError::encode("finish called before begin"))?;
        self.quantize_pending(&cfg);
        self.cfg = None;
        let mut frames = std::mem::take(&mut self.quantized);
        if frames.is_empty() {
            return Err(MorphError::encode("no frames to encode"));
        }
        let timestamps: Vec<u64> = frames.iter().map(|(t, _)| *t).collect();
        for ((_, frame), delay) in frames.iter_mut().zip(frame_delays(&timestamps, cfg.fps)) {
            frame.delay = delay;
        }

        let (w, h) = (cfg.width as u16, cfg.height as u16);
        let mut bytes = Vec::new();
        {
            let mut encoder = Encoder::new(&mut bytes, w, h, &[])
                .map_err(|e| MorphError::encode(format!("gif encoder setup failed: {e}")))?;
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| MorphError::encode(format!("gif encoder setup failed: {e}")))?;
            let total = frames.len();
            for (i, (_, frame)) in frames.iter().enumerate() {
                encoder
                    .write_frame(frame)
                    .map_err(|e| MorphError::encode(format!("gif frame {i} failed: {e}")))?;
                progress((i + 1) as f64 / total as f64);
            }
        }
        Ok(Blob::new(ExportFormat::Gif.mime_type(), bytes))
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.pending.clear();
        self.quantized.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
