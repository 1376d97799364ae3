use crate::foundation::core::Cell;
use crate::highlight::{HighlightNode, Highlighter, PLAIN_CLASS};
use std::collections::HashMap;

/// Color class per `(line, column)` of one code string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorMap {
    classes: HashMap<Cell, String>,
}

impl ColorMap {
    /// Class at `cell`, or [`PLAIN_CLASS`] when the cell is unknown.
    pub fn class_at(&self, cell: Cell) -> &str {
        self.classes.get(&cell).map_or(PLAIN_CLASS, String::as_str)
    }

    /// Class by `"line-column"` key.
    pub fn class_for_key(&self, key: &str) -> Option<&str> {
        let (line, column) = key.split_once('-')?;
        let cell = Cell::new(line.parse().ok()?, column.parse().ok()?);
        self.classes.get(&cell).map(String::as_str)
    }

    /// Number of mapped cells.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Return `true` when no cell is mapped.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Every character of `code` mapped to [`PLAIN_CLASS`].
    pub fn plain(code: &str) -> Self {
        let mut walker = Walker::default();
        walker.text(code, PLAIN_CLASS);
        Self {
            classes: walker.classes,
        }
    }
}

#[derive(Default)]
struct Walker {
    line: u32,
    column: u32,
    classes: HashMap<Cell, String>,
}

impl Walker {
    fn text(&mut self, text: &str, class: &str) {
        for ch in text.chars() {
            match ch {
                '\n' => {
                    self.line += 1;
                    self.column = 0;
                }
                '\r' => {}
                _ => {
                    self.classes
                        .insert(Cell::new(self.line, self.column), class.to_string());
                    self.column += 1;
                }
            }
        }
    }

    fn nodes(&mut self, nodes: &[HighlightNode], inherited: &str) {
        for node in nodes {
            match node {
                HighlightNode::Text(t) => self.text(t, inherited),
                HighlightNode::Element { class, children } => self.nodes(children, class),
            }
        }
    }
}

/// Build the color map of `code` in `language`.
///
/// Walks the highlighter's tagged output with the same cursor rules as the token differ;
/// untagged text inherits the nearest ancestor's class. Unsupported languages and highlighter
/// failures degrade to [`PLAIN_CLASS`] for every character.
pub fn color_map(code: &str, language: &str, highlighter: &dyn Highlighter) -> ColorMap {
    let nodes = match highlighter.highlight(code, language) {
        Ok(Some(nodes)) => nodes,
        Ok(None) => {
            tracing::debug!(language, "language not supported by highlighter, using plain");
            return ColorMap::plain(code);
        }
        Err(err) => {
            tracing::warn!(language, error = %err, "highlighter failed, using plain");
            return ColorMap::plain(code);
        }
    };

    let mut walker = Walker::default();
    walker.nodes(&nodes, PLAIN_CLASS);
    ColorMap {
        classes: walker.classes,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/highlight/color_map.rs"]
mod tests;
