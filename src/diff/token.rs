use crate::foundation::core::{Cell, GlyphMetrics, Position};
use similar::{Algorithm, DiffTag, capture_diff_slices};
use std::borrow::Cow;
use std::collections::HashMap;

/// Classification of a diff run or character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Present on both sides.
    Kept,
    /// Only present in the destination.
    Added,
    /// Only present in the source.
    Removed,
}

impl EntityKind {
    /// Lowercase name used in entity ids.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kept => "kept",
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }

    fn has_from(self) -> bool {
        self != Self::Added
    }

    fn has_to(self) -> bool {
        self != Self::Removed
    }
}

/// A contiguous run of text with a single classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeGroup {
    /// Run classification.
    pub kind: EntityKind,
    /// Run text, whitespace and newlines preserved.
    pub text: String,
}

/// One rendered character across a transition.
///
/// `Kept` entities have both positions, `Removed` only `from`, `Added` only `to`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TokenEntity {
    /// Deterministic id, unique within one diff.
    pub id: String,
    /// The character.
    pub content: char,
    /// Position in the source layout.
    pub from: Option<Position>,
    /// Position in the destination layout.
    pub to: Option<Position>,
    /// Cell in the source text.
    pub from_cell: Option<Cell>,
    /// Cell in the destination text.
    pub to_cell: Option<Cell>,
    /// Classification.
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

/// Entity counts of a [`TokenDiff`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Kept characters.
    pub kept: usize,
    /// Added characters.
    pub added: usize,
    /// Removed characters.
    pub removed: usize,
}

/// Flat entity list for one slide pair.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TokenDiff {
    /// Entities in diff order.
    pub entities: Vec<TokenEntity>,
    /// Metrics used to derive positions.
    #[serde(skip)]
    pub metrics: GlyphMetrics,
}

impl TokenDiff {
    /// Count entities by kind.
    pub fn stats(&self) -> DiffStats {
        let mut s = DiffStats::default();
        for e in &self.entities {
            match e.kind {
                EntityKind::Kept => s.kept += 1,
                EntityKind::Added => s.added += 1,
                EntityKind::Removed => s.removed += 1,
            }
        }
        s
    }

    /// Rebuild the source text from kept and removed entities.
    ///
    /// Line breaks are not entities and `\r` is dropped, so for CRLF input this is the code with
    /// every `\r\n` removed.
    pub fn source_text(&self) -> String {
        side_text(self.entities.iter().filter_map(|e| e.from_cell.map(|c| (c, e.content))))
    }

    /// Rebuild the destination text from kept and added entities, with the same line-break
    /// rules as [`TokenDiff::source_text`].
    pub fn destination_text(&self) -> String {
        side_text(self.entities.iter().filter_map(|e| e.to_cell.map(|c| (c, e.content))))
    }
}

fn side_text(cells: impl Iterator<Item = (Cell, char)>) -> String {
    let mut cells: Vec<(Cell, char)> = cells.collect();
    cells.sort_by_key(|(c, _)| *c);
    cells.into_iter().map(|(_, ch)| ch).collect()
}

/// Split code into word, whitespace and punctuation tokens.
///
/// Word runs are alphanumerics and `_`; whitespace runs are kept whole; brackets and quotes are
/// single tokens; other punctuation is grouped into runs (`=>`, `::`).
pub fn tokenize(code: &str) -> Vec<&str> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Class {
        Word,
        Space,
        Punct,
        Single,
    }

    fn class_of(c: char) -> Class {
        if c.is_alphanumeric() || c == '_' {
            Class::Word
        } else if c.is_whitespace() {
            Class::Space
        } else if matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '"' | '`') {
            Class::Single
        } else {
            Class::Punct
        }
    }

    let mut tokens = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<Class> = None;
    for (i, c) in code.char_indices() {
        let class = class_of(c);
        if let Some(p) = prev
            && (p != class || class == Class::Single)
        {
            tokens.push(&code[start..i]);
            start = i;
        }
        prev = Some(class);
    }
    if start < code.len() {
        tokens.push(&code[start..]);
    }
    tokens
}

/// Word diff of two code strings, whitespace preserved.
///
/// Replacements are reported as a removed group followed by an added group, and adjacent
/// groups of the same kind are coalesced.
pub fn diff_code(from_code: &str, to_code: &str) -> Vec<ChangeGroup> {
    let old = tokenize(from_code);
    let new = tokenize(to_code);
    let ops = capture_diff_slices(Algorithm::Myers, &old, &new);

    let mut groups: Vec<ChangeGroup> = Vec::new();
    let mut push = |kind: EntityKind, parts: &[&str]| {
        if parts.is_empty() {
            return;
        }
        let text = parts.concat();
        match groups.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(&text),
            _ => groups.push(ChangeGroup { kind, text }),
        }
    };

    for op in &ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => push(EntityKind::Kept, &old[old_range]),
            DiffTag::Delete => push(EntityKind::Removed, &old[old_range]),
            DiffTag::Insert => push(EntityKind::Added, &new[new_range]),
            DiffTag::Replace => {
                push(EntityKind::Removed, &old[old_range]);
                push(EntityKind::Added, &new[new_range]);
            }
        }
    }
    groups
}

fn normalize_newlines(code: &str) -> Cow<'_, str> {
    if code.contains("\r\n") {
        Cow::Owned(code.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(code)
    }
}

#[derive(Clone, Copy, Default)]
struct Cursor {
    line: u32,
    column: u32,
}

impl Cursor {
    fn cell(self) -> Cell {
        Cell::new(self.line, self.column)
    }

    fn newline(&mut self) {
        self.line += 1;
        self.column = 0;
    }
}

/// Diff two code strings and expand the result into positioned character entities.
///
/// Ids are `"{kind}-{line}-{column}"` keyed on the source cell for kept/removed characters and
/// the destination cell for added ones; repeats within one call get a `~n` suffix. The result
/// is a pure function of the inputs. `\r\n` is normalized to `\n` before diffing, so CRLF and
/// LF copies of the same code diff as equal; any other carriage return is dropped.
#[tracing::instrument(level = "debug", skip_all, fields(from_len = from_code.len(), to_len = to_code.len()))]
pub fn diff_tokens(from_code: &str, to_code: &str, metrics: GlyphMetrics) -> TokenDiff {
    let groups = diff_code(&normalize_newlines(from_code), &normalize_newlines(to_code));

    let mut from_cur = Cursor::default();
    let mut to_cur = Cursor::default();
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut entities = Vec::with_capacity(from_code.len().max(to_code.len()));

    for group in &groups {
        let kind = group.kind;
        for (i, fragment) in group.text.split('\n').enumerate() {
            if i > 0 {
                if kind.has_from() {
                    from_cur.newline();
                }
                if kind.has_to() {
                    to_cur.newline();
                }
            }

            for ch in fragment.chars().filter(|&c| c != '\r') {
                let from_cell = kind.has_from().then(|| from_cur.cell());
                let to_cell = kind.has_to().then(|| to_cur.cell());

                let key_cell = match kind {
                    EntityKind::Added => to_cur.cell(),
                    EntityKind::Kept | EntityKind::Removed => from_cur.cell(),
                };
                let base = format!("{}-{}-{}", kind.as_str(), key_cell.line, key_cell.column);
                let n = seen.entry(base.clone()).or_insert(0);
                let id = if *n == 0 { base } else { format!("{base}~{n}") };
                *n += 1;

                entities.push(TokenEntity {
                    id,
                    content: ch,
                    from: from_cell.map(|c| c.position(metrics)),
                    to: to_cell.map(|c| c.position(metrics)),
                    from_cell,
                    to_cell,
                    kind,
                });

                if kind.has_from() {
                    from_cur.column += 1;
                }
                if kind.has_to() {
                    to_cur.column += 1;
                }
            }
        }
    }

    tracing::debug!(entities = entities.len(), groups = groups.len(), "token diff");
    TokenDiff { entities, metrics }
}

#[cfg(test)]
#[path = "../../tests/unit/diff/token.rs"]
mod tests;
