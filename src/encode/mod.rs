//! Frame encoders: the streaming and recorded ffmpeg paths and the batched GIF path.

/// `ffmpeg` process plumbing and the streaming video encoder.
pub mod ffmpeg;
/// Batched GIF encoder.
pub mod gif;
/// Canvas-backed fallback video recorder.
pub mod recorder;
/// Encoder contract, configuration and output blobs.
pub mod sink;
