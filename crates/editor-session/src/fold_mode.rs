//! Fold widget detection.
//!
//! A [`FoldProvider`] tells the session which rows can start (or, with
//! [`FoldStyle::MarkBeginEnd`], end) a foldable region and what range that region covers.
//! The session never interprets language syntax itself; it only calls these two hooks.

use crate::bracket::{find_closing_bracket, find_opening_bracket};
use crate::document::Document;
use crate::error::{Result, SessionError};
use crate::range::{Position, Range};
use crate::text::{char_len, leading_whitespace};
use editor_session_lang::{BracketConfig, FoldMarkerConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which fold widgets are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldStyle {
    /// No widgets; folds are only created explicitly.
    Manual,
    /// Widgets on rows that open a region.
    #[default]
    MarkBegin,
    /// Widgets on rows that open or close a region.
    MarkBeginEnd,
}

impl FoldStyle {
    const VALID: &'static str = "manual, markbegin, markbeginend";

    /// Returns `true` for [`FoldStyle::Manual`].
    pub fn is_manual(self) -> bool {
        self == Self::Manual
    }
}

impl FromStr for FoldStyle {
    type Err = SessionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "markbegin" => Ok(Self::MarkBegin),
            "markbeginend" => Ok(Self::MarkBeginEnd),
            other => Err(SessionError::InvalidFoldStyle {
                style: other.to_string(),
                valid: Self::VALID.to_string(),
            }),
        }
    }
}

impl fmt::Display for FoldStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::MarkBegin => "markbegin",
            Self::MarkBeginEnd => "markbeginend",
        })
    }
}

/// Kind of fold widget shown next to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldWidget {
    /// The row opens a foldable region.
    Start,
    /// The row closes a foldable region.
    End,
}

/// Language-specific fold detection.
pub trait FoldProvider: Send {
    /// Widget for `row`, if any.
    fn fold_widget(&self, doc: &Document, style: FoldStyle, row: usize) -> Option<FoldWidget>;

    /// Range folded by the widget on `row`.
    fn fold_widget_range(&self, doc: &Document, style: FoldStyle, row: usize) -> Option<Range>;
}

/// Column of the first char after the leading spaces and tabs, or `None` for a blank line.
fn indent_level(line: &str) -> Option<usize> {
    let indent = leading_whitespace(line);
    (indent.len() < line.trim_end().len()).then(|| char_len(indent))
}

/// Rows below `row` that are indented deeper than it, as a range starting at `column` (or
/// the end of `row`). Blank rows do not end the block.
pub fn indentation_block(doc: &Document, row: usize, column: Option<usize>) -> Option<Range> {
    let line = doc.line(row);
    let start_level = indent_level(line)?;
    let start_column = column.unwrap_or_else(|| char_len(line));
    let mut end_row = row;
    for next in row + 1..doc.len() {
        let Some(level) = indent_level(doc.line(next)) else {
            continue;
        };
        if level <= start_level {
            break;
        }
        end_row = next;
    }
    (end_row > row).then(|| Range::new(row, start_column, end_row, doc.line_len(end_row)))
}

/// Brace and bracket folding driven by [`FoldMarkerConfig`] patterns.
#[derive(Debug, Clone)]
pub struct BraceFoldProvider {
    start: Regex,
    end: Regex,
    brackets: BracketConfig,
}

impl BraceFoldProvider {
    /// Compile the marker patterns.
    pub fn new(markers: &FoldMarkerConfig, brackets: BracketConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| SessionError::RegexCompile {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
        };
        Ok(Self {
            start: compile(&markers.start)?,
            end: compile(&markers.end)?,
            brackets,
        })
    }

    /// C-style `{}`/`[]` folding.
    pub fn cstyle() -> Self {
        Self::new(&FoldMarkerConfig::cstyle(), BracketConfig::default())
            .expect("valid cstyle fold markers")
    }

    /// Region opened by `bracket` at `column`, ending before its partner.
    ///
    /// When the partner's row opens another region (`} else {`), the range stops at the end
    /// of the previous row so the two regions stay separate.
    fn opening_bracket_block(
        &self,
        doc: &Document,
        style: FoldStyle,
        bracket: char,
        row: usize,
        column: usize,
    ) -> Option<Range> {
        let start = Position::new(row, column + 1);
        let mut end = find_closing_bracket(doc, &self.brackets, bracket, start)?;
        if end.row > start.row && self.fold_widget(doc, style, end.row) == Some(FoldWidget::Start) {
            end.row -= 1;
            end.column = doc.line_len(end.row);
        }
        Some(Range::from_points(start, end))
    }

    /// Region closed by `bracket`, which sits just before `column`.
    fn closing_bracket_block(
        &self,
        doc: &Document,
        bracket: char,
        row: usize,
        column: usize,
    ) -> Option<Range> {
        let end = Position::new(row, column);
        let start = find_opening_bracket(doc, &self.brackets, bracket, end)?;
        Some(Range::new(
            start.row,
            start.column + 1,
            end.row,
            end.column.saturating_sub(1),
        ))
    }
}

impl Default for BraceFoldProvider {
    fn default() -> Self {
        Self::cstyle()
    }
}

impl FoldProvider for BraceFoldProvider {
    fn fold_widget(&self, doc: &Document, style: FoldStyle, row: usize) -> Option<FoldWidget> {
        let line = doc.line(row);
        if self.start.is_match(line) {
            return Some(FoldWidget::Start);
        }
        if style == FoldStyle::MarkBeginEnd && self.end.is_match(line) {
            return Some(FoldWidget::End);
        }
        None
    }

    fn fold_widget_range(&self, doc: &Document, style: FoldStyle, row: usize) -> Option<Range> {
        let line = doc.line(row);
        if let Some(caps) = self.start.captures(line) {
            let bracket = caps.get(1)?;
            let ch = bracket.as_str().chars().next()?;
            let column = char_len(&line[..bracket.start()]);
            return self.opening_bracket_block(doc, style, ch, row, column);
        }
        if style == FoldStyle::MarkBegin {
            return None;
        }
        let caps = self.end.captures(line)?;
        let bracket = caps.get(1)?;
        let ch = bracket.as_str().chars().next()?;
        let column = char_len(&line[..caps.get(0)?.end()]);
        self.closing_bracket_block(doc, ch, row, column)
    }
}

/// Folds blocks of deeper-indented rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentFoldProvider;

impl FoldProvider for IndentFoldProvider {
    fn fold_widget(&self, doc: &Document, _style: FoldStyle, row: usize) -> Option<FoldWidget> {
        let level = indent_level(doc.line(row))?;
        let next = (row + 1..doc.len()).find_map(|r| indent_level(doc.line(r)))?;
        (next > level).then_some(FoldWidget::Start)
    }

    fn fold_widget_range(&self, doc: &Document, _style: FoldStyle, row: usize) -> Option<Range> {
        indentation_block(doc, row, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "fn main() {\n    let v = [\n        1,\n    ];\n}\nx";

    #[test]
    fn test_fold_style_parse() {
        assert_eq!("markbeginend".parse::<FoldStyle>(), Ok(FoldStyle::MarkBeginEnd));
        let err = "sideways".parse::<FoldStyle>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid fold style 'sideways', expected one of: manual, markbegin, markbeginend"
        );
    }

    #[test]
    fn test_brace_widgets() {
        let doc = Document::new(SOURCE);
        let p = BraceFoldProvider::cstyle();
        assert_eq!(p.fold_widget(&doc, FoldStyle::MarkBegin, 0), Some(FoldWidget::Start));
        assert_eq!(p.fold_widget(&doc, FoldStyle::MarkBegin, 1), Some(FoldWidget::Start));
        assert_eq!(p.fold_widget(&doc, FoldStyle::MarkBegin, 2), None);
        assert_eq!(p.fold_widget(&doc, FoldStyle::MarkBegin, 4), None);
        assert_eq!(p.fold_widget(&doc, FoldStyle::MarkBeginEnd, 4), Some(FoldWidget::End));
    }

    #[test]
    fn test_brace_ranges() {
        let doc = Document::new(SOURCE);
        let p = BraceFoldProvider::cstyle();
        assert_eq!(
            p.fold_widget_range(&doc, FoldStyle::MarkBegin, 0),
            Some(Range::new(0, 11, 4, 0))
        );
        assert_eq!(
            p.fold_widget_range(&doc, FoldStyle::MarkBegin, 1),
            Some(Range::new(1, 13, 3, 4))
        );
        assert_eq!(p.fold_widget_range(&doc, FoldStyle::MarkBegin, 4), None);
        assert_eq!(
            p.fold_widget_range(&doc, FoldStyle::MarkBeginEnd, 4),
            Some(Range::new(0, 11, 4, 0))
        );
    }

    #[test]
    fn test_else_row_stops_previous_block() {
        let doc = Document::new("if a {\n  b\n} else {\n  c\n}");
        let p = BraceFoldProvider::cstyle();
        assert_eq!(
            p.fold_widget_range(&doc, FoldStyle::MarkBegin, 0),
            Some(Range::new(0, 6, 1, 3))
        );
    }

    #[test]
    fn test_indent_level_counts_leading_spaces_and_tabs() {
        assert_eq!(indent_level("\t  x"), Some(3));
        assert_eq!(indent_level("x"), Some(0));
        assert_eq!(indent_level(" \t "), None);
        assert_eq!(indent_level(""), None);
    }

    #[test]
    fn test_indentation_block() {
        let doc = Document::new("def f():\n    a\n\n    b\nc");
        assert_eq!(indentation_block(&doc, 0, None), Some(Range::new(0, 8, 3, 5)));
        assert_eq!(indentation_block(&doc, 1, None), None);
        assert_eq!(indentation_block(&doc, 2, None), None);

        let p = IndentFoldProvider;
        assert_eq!(p.fold_widget(&doc, FoldStyle::MarkBegin, 0), Some(FoldWidget::Start));
        assert_eq!(p.fold_widget(&doc, FoldStyle::MarkBegin, 1), None);
        assert_eq!(
            p.fold_widget_range(&doc, FoldStyle::MarkBegin, 0),
            Some(Range::new(0, 8, 3, 5))
        );
    }
}
