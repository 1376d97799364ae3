use crate::foundation::error::MorphResult;
use crate::highlight::{HighlightNode, Highlighter};

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "from", "function", "if",
    "import", "in", "instanceof", "let", "new", "null", "of", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "yield",
];

const TS_EXTRA_KEYWORDS: &[&str] = &[
    "abstract",
    "any",
    "as",
    "boolean",
    "declare",
    "enum",
    "implements",
    "interface",
    "keyof",
    "namespace",
    "never",
    "number",
    "private",
    "protected",
    "public",
    "readonly",
    "string",
    "type",
    "unknown",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "False", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "None", "nonlocal", "not", "or", "pass", "raise", "return", "True", "try", "while",
    "with", "yield",
];

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "nil", "package", "range",
    "return", "select", "struct", "switch", "type", "var", "true", "false",
];

const JSON_KEYWORDS: &[&str] = &["true", "false", "null"];

#[derive(Clone, Copy, Debug)]
struct LanguageDef {
    keywords: &'static [&'static str],
    extra_keywords: &'static [&'static str],
    line_comment: &'static str,
    block_comments: bool,
    backtick_strings: bool,
    char_literals: bool,
    property_keys: bool,
}

fn language_def(language: &str) -> Option<LanguageDef> {
    let base = LanguageDef {
        keywords: &[],
        extra_keywords: &[],
        line_comment: "//",
        block_comments: true,
        backtick_strings: false,
        char_literals: false,
        property_keys: false,
    };
    let def = match language.trim().to_ascii_lowercase().as_str() {
        "rust" | "rs" => LanguageDef {
            keywords: RUST_KEYWORDS,
            char_literals: true,
            ..base
        },
        "javascript" | "js" | "jsx" => LanguageDef {
            keywords: JS_KEYWORDS,
            backtick_strings: true,
            ..base
        },
        "typescript" | "ts" | "tsx" => LanguageDef {
            keywords: JS_KEYWORDS,
            extra_keywords: TS_EXTRA_KEYWORDS,
            backtick_strings: true,
            ..base
        },
        "python" | "py" => LanguageDef {
            keywords: PYTHON_KEYWORDS,
            line_comment: "#",
            block_comments: false,
            ..base
        },
        "go" | "golang" => LanguageDef {
            keywords: GO_KEYWORDS,
            backtick_strings: true,
            ..base
        },
        "json" => LanguageDef {
            keywords: JSON_KEYWORDS,
            line_comment: "",
            block_comments: false,
            property_keys: true,
            ..base
        },
        _ => return None,
    };
    Some(def)
}

/// Small single-pass lexer covering common languages.
///
/// Classes: `keyword`, `string` (with nested `escape`), `number`, `comment`, `punctuation`,
/// `function`, `type`, `property`. Whitespace and plain identifiers are left untagged.
#[derive(Clone, Copy, Debug, Default)]
pub struct LexicalHighlighter;

impl LexicalHighlighter {
    /// Return `true` when `language` has a built-in definition.
    pub fn supports(language: &str) -> bool {
        language_def(language).is_some()
    }
}

impl Highlighter for LexicalHighlighter {
    fn highlight(&self, code: &str, language: &str) -> MorphResult<Option<Vec<HighlightNode>>> {
        Ok(language_def(language).map(|def| Lexer::new(code, def).run()))
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    def: LanguageDef,
    out: Vec<HighlightNode>,
    plain: String,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, def: LanguageDef) -> Self {
        Self {
            src,
            pos: 0,
            def,
            out: Vec::new(),
            plain: String::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn flush_plain(&mut self) {
        if !self.plain.is_empty() {
            self.out
                .push(HighlightNode::Text(std::mem::take(&mut self.plain)));
        }
    }

    fn emit(&mut self, node: HighlightNode) {
        self.flush_plain();
        self.out.push(node);
    }

    fn take_while(&mut self, mut f: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !f(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn run(mut self) -> Vec<HighlightNode> {
        while let Some(c) = self.peek() {
            let rest = self.rest();
            if !self.def.line_comment.is_empty() && rest.starts_with(self.def.line_comment) {
                let text = self.take_while(|c| c != '\n');
                self.emit(HighlightNode::span("comment", text));
            } else if self.def.block_comments && rest.starts_with("/*") {
                let end = rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
                let text = &rest[..end];
                self.pos += end;
                self.emit(HighlightNode::span("comment", text));
            } else if c == '"' || (c == '`' && self.def.backtick_strings) {
                self.string(c);
            } else if c == '\'' {
                self.single_quote();
            } else if c.is_ascii_digit() {
                let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                self.emit(HighlightNode::span("number", text));
            } else if c.is_alphabetic() || c == '_' {
                let word = self.take_while(|c| c.is_alphanumeric() || c == '_');
                self.word(word);
            } else if c.is_whitespace() {
                let ws = self.take_while(char::is_whitespace);
                self.plain.push_str(ws);
            } else {
                self.pos += c.len_utf8();
                self.emit(HighlightNode::span("punctuation", c.to_string()));
            }
        }
        self.flush_plain();
        self.out
    }

    fn word(&mut self, word: &str) {
        if self.def.keywords.contains(&word) || self.def.extra_keywords.contains(&word) {
            self.emit(HighlightNode::span("keyword", word));
        } else if self.rest().trim_start_matches([' ', '\t']).starts_with('(') {
            self.emit(HighlightNode::span("function", word));
        } else if word.chars().next().is_some_and(char::is_uppercase) {
            self.emit(HighlightNode::span("type", word));
        } else {
            self.plain.push_str(word);
        }
    }

    /// Quoted string with nested `escape` spans. Unterminated strings run to end of line.
    fn string(&mut self, quote: char) {
        let mut children = Vec::new();
        let mut buf = String::new();
        buf.push(quote);
        self.pos += quote.len_utf8();
        while let Some(c) = self.peek() {
            if c == '\\' {
                if !buf.is_empty() {
                    children.push(HighlightNode::Text(std::mem::take(&mut buf)));
                }
                let start = self.pos;
                self.pos += 1;
                if let Some(next) = self.peek() {
                    self.pos += next.len_utf8();
                }
                children.push(HighlightNode::span("escape", &self.src[start..self.pos]));
                continue;
            }
            if c == '\n' && quote != '`' {
                break;
            }
            self.pos += c.len_utf8();
            buf.push(c);
            if c == quote {
                break;
            }
        }
        if !buf.is_empty() {
            children.push(HighlightNode::Text(buf));
        }

        let class = if self.def.property_keys
            && self.rest().trim_start_matches([' ', '\t']).starts_with(':')
        {
            "property"
        } else {
            "string"
        };
        self.emit(HighlightNode::Element {
            class: class.to_string(),
            children,
        });
    }

    /// `'` opens a string, a char literal, or (in Rust) a lifetime.
    fn single_quote(&mut self) {
        if !self.def.char_literals {
            self.string('\'');
            return;
        }
        let rest = self.rest();
        let mut chars = rest.char_indices().skip(1);
        let is_char_literal = match (chars.next(), chars.next()) {
            (Some((_, '\\')), _) => true,
            (Some(_), Some((_, '\''))) => true,
            _ => false,
        };
        if is_char_literal {
            self.string('\'');
        } else {
            self.pos += 1;
            let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
            self.emit(HighlightNode::span("type", format!("'{name}")));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/highlight/lexer.rs"]
mod tests;
