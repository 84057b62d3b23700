#![warn(missing_docs)]
//! `editor-session-lang` - data-driven language configuration helpers for `editor-session`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any tokenizer or
//! parser. It provides small structs that hosts use to configure bracket matching and
//! fold-widget detection in a language-aware way.

/// Bracket pairs recognized by bracket matching and brace folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketConfig {
    /// `(open, close)` pairs, e.g. `('(', ')')`.
    pub pairs: Vec<(char, char)>,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            pairs: vec![('(', ')'), ('[', ']'), ('{', '}')],
        }
    }
}

impl BracketConfig {
    /// Create a config from explicit pairs.
    pub fn new(pairs: impl IntoIterator<Item = (char, char)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Returns the closing bracket for `open`, if `open` is an opening bracket.
    pub fn closing_for(&self, open: char) -> Option<char> {
        self.pairs
            .iter()
            .find(|(o, _)| *o == open)
            .map(|(_, c)| *c)
    }

    /// Returns the opening bracket for `close`, if `close` is a closing bracket.
    pub fn opening_for(&self, close: char) -> Option<char> {
        self.pairs
            .iter()
            .find(|(_, c)| *c == close)
            .map(|(o, _)| *o)
    }

    /// Returns `true` if `ch` is an opening bracket.
    pub fn is_opening(&self, ch: char) -> bool {
        self.closing_for(ch).is_some()
    }

    /// Returns `true` if `ch` is a closing bracket.
    pub fn is_closing(&self, ch: char) -> bool {
        self.opening_for(ch).is_some()
    }
}

/// Regex sources describing where brace-style fold regions start and end.
///
/// A start marker matches a line that opens a block which is not closed on the same line;
/// capture group 1 must cover the opening bracket. An end marker matches a line that closes
/// a block opened earlier; capture group 1 must cover the closing bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldMarkerConfig {
    /// Pattern for lines that start a fold region.
    pub start: String,
    /// Pattern for lines that end a fold region (used by `markbeginend`).
    pub end: String,
}

impl FoldMarkerConfig {
    /// C-style braces and square brackets.
    pub fn cstyle() -> Self {
        Self {
            start: r"(\{|\[)[^\}\]]*$".to_string(),
            end: r"^[^\[\{]*(\}|\])".to_string(),
        }
    }

    /// Create a config from custom patterns.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for FoldMarkerConfig {
    fn default() -> Self {
        Self::cstyle()
    }
}
