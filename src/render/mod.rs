//! Render capability, the frame composition contract, and a CPU reference renderer.

/// Render surface trait and captured bitmaps.
pub mod backend;
/// CPU renderer (`vello_cpu` + `parley`).
pub mod cpu;
/// Glyph placement for a frame.
pub mod scene;
/// Background and color-class palettes.
pub mod theme;
