/// Crate-wide result alias.
pub type MorphResult<T> = Result<T, MorphError>;

/// Error taxonomy shared by diffing, playback, rendering and export.
#[derive(thiserror::Error, Debug)]
pub enum MorphError {
    /// Playback and export need at least one transition.
    #[error("insufficient slides: need at least 2, got {count}")]
    InsufficientSlides {
        /// Number of slides that were provided.
        count: usize,
    },

    /// Requested format/codec/resolution combination is not supported by the runtime.
    #[error("encoder configuration error: {0}")]
    EncoderConfiguration(String),

    /// The render surface could not be rasterized.
    #[error("capture error: {0}")]
    Capture(String),

    /// Streaming encoder or recorder failed mid-export.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid input (project file, settings, frame sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Syntax highlighter failure.
    #[error("highlight error: {0}")]
    Highlight(String),

    /// Anything else, typically I/O with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MorphError {
    /// Build an [`MorphError::InsufficientSlides`].
    pub fn insufficient_slides(count: usize) -> Self {
        Self::InsufficientSlides { count }
    }

    /// Build an [`MorphError::EncoderConfiguration`].
    pub fn encoder_configuration(msg: impl Into<String>) -> Self {
        Self::EncoderConfiguration(msg.into())
    }

    /// Build an [`MorphError::Capture`].
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build an [`MorphError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build an [`MorphError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`MorphError::Highlight`].
    pub fn highlight(msg: impl Into<String>) -> Self {
        Self::Highlight(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
