use crate::foundation::core::Canvas;
use crate::foundation::error::MorphResult;
use crate::model::slide::{AnimationSettings, EditorSettings};
use crate::playback::orchestrator::AnimationFrame;

/// A captured frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Opaque frame filled with one color.
    pub fn solid(canvas: Canvas, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(canvas.rgba_len());
        for _ in 0..(canvas.width as usize * canvas.height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
            premultiplied: false,
        }
    }

    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Pixels with straight (non-premultiplied) alpha, as image files expect.
    pub fn straight_alpha(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                out.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            for &c in &px[..3] {
                let v = (u16::from(c) * 255 + a / 2) / a;
                out.push(v.min(255) as u8);
            }
            out.push(px[3]);
        }
        out
    }
}

/// Everything a renderer may consult besides the frame itself. Opaque to the core.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    /// Playback settings (resolution, transition type).
    pub settings: &'a AnimationSettings,
    /// Cosmetic pass-through settings.
    pub editor: &'a EditorSettings,
}

/// External render capability: draws an [`AnimationFrame`] and rasterizes the result.
pub trait RenderSurface {
    /// Drop any per-export state. Called once before the first frame of an export.
    fn reset(&mut self) {}

    /// Draw `frame` onto the surface.
    fn render(&mut self, frame: &AnimationFrame, req: &RenderRequest<'_>) -> MorphResult<()>;

    /// Rasterize the current surface at exactly `canvas` size.
    fn capture(&mut self, canvas: Canvas) -> MorphResult<FrameRGBA>;
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
