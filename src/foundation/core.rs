use crate::foundation::error::{MorphError, MorphResult};

pub use kurbo::Point;

/// Pixel position of a glyph cell's top-left corner in layout space.
pub type Position = Point;

/// Absolute 0-based frame index in playback timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Presentation timestamp of this frame in microseconds at `fps`.
    pub fn timestamp_us(self, fps: u32) -> u64 {
        if fps == 0 {
            return 0;
        }
        let frame_us = 1_000_000.0 / f64::from(fps);
        (self.0 as f64 * frame_us).round() as u64
    }
}

/// A `(line, column)` cell in a monospace text grid. Both are 0-based and counted in chars.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    /// 0-based line.
    pub line: u32,
    /// 0-based column, in characters.
    pub column: u32,
}

impl Cell {
    /// Create a new cell.
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The `"line-column"` lookup key used by color maps.
    pub fn key(self) -> String {
        format!("{}-{}", self.line, self.column)
    }

    /// Top-left pixel position of this cell.
    pub fn position(self, metrics: GlyphMetrics) -> Position {
        Point::new(
            f64::from(self.column) * metrics.char_width,
            f64::from(self.line) * metrics.line_height,
        )
    }
}

/// Monospace cell size used to turn cells into pixel positions.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GlyphMetrics {
    /// Advance width of one character in pixels.
    pub char_width: f64,
    /// Distance between baselines in pixels.
    pub line_height: f64,
}

impl GlyphMetrics {
    /// Create validated metrics.
    pub fn new(char_width: f64, line_height: f64) -> MorphResult<Self> {
        if !char_width.is_finite() || char_width <= 0.0 {
            return Err(MorphError::validation("char_width must be finite and > 0"));
        }
        if !line_height.is_finite() || line_height <= 0.0 {
            return Err(MorphError::validation("line_height must be finite and > 0"));
        }
        Ok(Self {
            char_width,
            line_height,
        })
    }

    /// Monospace approximation for a font size: 0.6em advance, 1.5em line height.
    pub fn for_font_size(font_size: f64) -> Self {
        Self {
            char_width: font_size * 0.6,
            line_height: font_size * 1.5,
        }
    }
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self::for_font_size(16.0)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of bytes in a tightly packed RGBA8 frame of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
