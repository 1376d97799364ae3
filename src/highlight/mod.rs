//! Syntax highlighting capability and the position -> color-class mapping built on it.

use crate::foundation::error::MorphResult;

/// Position -> color-class lookup.
pub mod color_map;
/// Built-in lexical highlighter.
pub mod lexer;

/// Class assigned to characters with no tagged ancestor or in unsupported languages.
pub const PLAIN_CLASS: &str = "plain";

/// Tagged markup produced by a highlighter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HighlightNode {
    /// Raw text; inherits the nearest ancestor's class.
    Text(String),
    /// A classed span with nested content.
    Element {
        /// Color class label (`keyword`, `string`, ...).
        class: String,
        /// Nested nodes.
        children: Vec<HighlightNode>,
    },
}

impl HighlightNode {
    /// Text leaf.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Classed span containing a single text leaf.
    pub fn span(class: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Element {
            class: class.into(),
            children: vec![Self::Text(text.into())],
        }
    }
}

/// External syntax-highlighting capability.
///
/// Concatenating the text leaves of the returned nodes in document order must reproduce `code`.
pub trait Highlighter {
    /// Highlight `code`, or return `Ok(None)` when `language` is not supported.
    fn highlight(&self, code: &str, language: &str) -> MorphResult<Option<Vec<HighlightNode>>>;
}

/// Highlighter that supports no language; every character maps to [`PLAIN_CLASS`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, _code: &str, _language: &str) -> MorphResult<Option<Vec<HighlightNode>>> {
        Ok(None)
    }
}
