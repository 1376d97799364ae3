//! Word-level code diffing expanded to character entities.

/// Token differ and entity expansion.
pub mod token;
