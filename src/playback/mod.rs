//! Slide/transition timeline sequencing for preview and export.

/// Pacing clocks.
pub mod clock;
/// Frame sequencing.
pub mod orchestrator;
