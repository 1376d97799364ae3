/// Slides, settings and cosmetic pass-through configuration.
pub mod slide;
/// JSON project files.
pub mod project;
