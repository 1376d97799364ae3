use crate::foundation::core::Canvas;
use crate::foundation::error::{MorphError, MorphResult};
use std::path::PathBuf;

/// One code snapshot with a display duration.
///
/// Slides are immutable once handed to playback or export.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationSlide {
    /// Caller-assigned identifier.
    pub id: String,
    /// Source text shown on this slide.
    pub code: String,
    /// Optional display title.
    #[serde(default)]
    pub title: String,
    /// Language name handed to the highlighter.
    #[serde(default = "default_language")]
    pub language: String,
    /// Hold duration in seconds (> 0).
    pub duration: f64,
}

fn default_language() -> String {
    "plaintext".to_string()
}

impl AnimationSlide {
    /// Convenience constructor with an empty title.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        language: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            title: String::new(),
            language: language.into(),
            duration,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Number of hold frames at `fps`: `ceil(duration * fps)`.
    pub fn hold_frames(&self, fps: u32) -> u64 {
        frames_for_secs(self.duration, fps)
    }

    pub(crate) fn validate(&self) -> MorphResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(MorphError::validation(format!(
                "slide '{}' duration must be finite and > 0",
                self.id
            )));
        }
        Ok(())
    }
}

/// `ceil(secs * fps)`, tolerant of float noise such as `0.2 * 30 = 6.000000000000001`.
///
/// Saturates at `u64::MAX`; use [`checked_frames_for_secs`] where that matters.
pub(crate) fn frames_for_secs(secs: f64, fps: u32) -> u64 {
    checked_frames_for_secs(secs, fps).unwrap_or(u64::MAX)
}

/// [`frames_for_secs`], or `None` when the count does not fit in a `u64`.
pub(crate) fn checked_frames_for_secs(secs: f64, fps: u32) -> Option<u64> {
    let frames = ((secs * f64::from(fps)) - 1e-9).ceil().max(0.0);
    // `u64::MAX as f64` rounds up to 2^64.
    (frames.is_finite() && frames < u64::MAX as f64).then_some(frames as u64)
}

/// Output resolution presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Resolution {
    /// 1280x720.
    #[serde(rename = "720p")]
    Hd720,
    /// 1920x1080.
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
}

impl Resolution {
    /// Pixel dimensions of this preset.
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Hd720 => Canvas {
                width: 1280,
                height: 720,
            },
            Self::Hd1080 => Canvas {
                width: 1920,
                height: 1080,
            },
        }
    }
}

/// How the render consumer bridges two slides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    /// Character-level morph driven by the token diff.
    #[default]
    Diff,
    /// Whole-layout crossfade.
    Fade,
}

/// Container produced by export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// H.264 in MP4.
    #[default]
    Mp4,
    /// VP9 in WebM.
    Webm,
    /// Animated GIF.
    Gif,
}

impl ExportFormat {
    /// MIME type of the exported blob.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::Gif => "image/gif",
        }
    }

    /// Conventional file extension (without dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Gif => "gif",
        }
    }

    /// Guess a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// Playback and export settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Frames per second (> 0).
    pub fps: u32,
    /// Export resolution.
    pub resolution: Resolution,
    /// Transition style.
    pub transition_type: TransitionType,
    /// Export container.
    pub export_format: ExportFormat,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            resolution: Resolution::default(),
            transition_type: TransitionType::default(),
            export_format: ExportFormat::default(),
        }
    }
}

impl AnimationSettings {
    /// Validate numeric ranges.
    pub fn validate(&self) -> MorphResult<()> {
        if self.fps == 0 {
            return Err(MorphError::validation("fps must be > 0"));
        }
        Ok(())
    }
}

/// Cosmetic settings passed through to the renderer untouched.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Background theme name (`dark`, `light`, `midnight`, ...).
    pub background: String,
    /// Monospace font file. Required by the CPU renderer.
    pub font_path: Option<PathBuf>,
    /// Font size in pixels.
    pub font_size: f64,
    /// Draw the themed background instead of a transparent canvas.
    pub show_background: bool,
    /// Inset of the code block from the canvas edge, in pixels.
    pub padding: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            background: "dark".to_string(),
            font_path: None,
            font_size: 24.0,
            show_background: true,
            padding: 48.0,
        }
    }
}

impl EditorSettings {
    /// Validate numeric ranges.
    pub fn validate(&self) -> MorphResult<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(MorphError::validation("font_size must be finite and > 0"));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(MorphError::validation("padding must be finite and >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/slide.rs"]
mod tests;
