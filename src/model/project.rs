use crate::foundation::error::{MorphError, MorphResult};
use crate::model::slide::{AnimationSettings, AnimationSlide, EditorSettings};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON-facing project file: slides plus playback and cosmetic settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    /// Slides in playback order.
    pub slides: Vec<AnimationSlide>,
    /// Playback/export settings.
    #[serde(default)]
    pub settings: AnimationSettings,
    /// Renderer pass-through settings.
    #[serde(default)]
    pub editor: EditorSettings,
}

impl Project {
    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MorphResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| MorphError::validation(format!("parse project JSON: {e}")))
    }

    /// Parse a project from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MorphResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MorphError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Resolve a relative font path against the project file's directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(font) = self.editor.font_path.as_mut()
            && font.is_relative()
        {
            *font = base.join(&*font);
        }
    }

    /// Validate settings and slides.
    ///
    /// The slide count is not checked here; playback rejects fewer than two slides.
    pub fn validate(&self) -> MorphResult<()> {
        self.settings.validate()?;
        self.editor.validate()?;
        let mut seen = HashSet::new();
        for slide in &self.slides {
            slide.validate()?;
            if !seen.insert(slide.id.as_str()) {
                return Err(MorphError::validation(format!(
                    "duplicate slide id '{}'",
                    slide.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/project.rs"]
mod tests;
