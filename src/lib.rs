//! codemorph animates code between slides one character at a time.
//!
//! The pipeline is:
//!
//! - diff adjacent slides into kept/added/removed character entities ([`diff_tokens`])
//! - expand each pair into eased transition frames ([`generate_transition`])
//! - sequence holds and transitions into one timeline ([`play`])
//! - render, capture and encode that timeline into MP4, WebM or GIF ([`FrameCaptureExporter`])
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Easing curves and slide-to-slide transitions.
pub mod animation;
/// Character-level code diffing.
pub mod diff;
/// Video and GIF encoders.
pub mod encode;
/// Frame capture export.
pub mod export;
/// Syntax highlighting and color maps.
pub mod highlight;
/// Slides, settings and project files.
pub mod model;
/// Timeline sequencing.
pub mod playback;
/// Render capability and the CPU renderer.
pub mod render;

pub use crate::foundation::core::{Canvas, Cell, FrameIndex, GlyphMetrics, Point, Position};
pub use crate::foundation::error::{MorphError, MorphResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::transition::{TransitionFrame, TransitionFrames, generate_transition};
pub use crate::diff::token::{
    ChangeGroup, DiffStats, EntityKind, TokenDiff, TokenEntity, diff_code, diff_tokens, tokenize,
};
pub use crate::encode::sink::{Blob, EncodeConfig, FrameEncoder, InMemoryEncoder};
pub use crate::export::exporter::{
    CancellationToken, ExportObserver, ExportOptions, ExportOutcome, ExportStats,
    FrameCaptureExporter,
};
pub use crate::export::strategy::{
    EncoderCapabilities, EncoderProvider, EncoderStrategy, SystemEncoders, select_strategy,
};
pub use crate::highlight::color_map::{ColorMap, color_map};
pub use crate::highlight::lexer::LexicalHighlighter;
pub use crate::highlight::{HighlightNode, Highlighter, PlainHighlighter};
pub use crate::model::project::Project;
pub use crate::model::slide::{
    AnimationSettings, AnimationSlide, EditorSettings, ExportFormat, Resolution, TransitionType,
};
pub use crate::playback::orchestrator::{
    AnimationFrame, FrameProgress, Playback, PlaybackOptions, calculate_total_duration, play,
    total_frame_count,
};
pub use crate::render::backend::{FrameRGBA, RenderRequest, RenderSurface};
pub use crate::render::cpu::CpuRenderer;
