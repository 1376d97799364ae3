//! FrameCaptureExporter: instant playback driven through a render surface into an encoder.

/// Export driver, options and outcomes.
pub mod exporter;
/// Stable per-frame fingerprints for static-frame elision.
pub mod fingerprint;
/// Monotonic, capped progress reporting.
pub mod progress;
/// Encoder capability detection and strategy selection.
pub mod strategy;
