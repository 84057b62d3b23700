//! Structured document change deltas.
//!
//! Every buffer mutation is described by exactly one [`Delta`]. Deltas carry enough data to
//! be replayed ([`Document::apply_delta`](crate::Document::apply_delta)) and inverted
//! ([`Delta::inverse`]), which is what undo/redo is built on.

use crate::range::Range;
use serde::{Deserialize, Serialize};

/// The kind of change a [`Delta`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaAction {
    /// Text (possibly containing line breaks) was inserted.
    InsertText,
    /// Text (possibly spanning rows) was removed.
    RemoveText,
    /// Whole lines were inserted.
    InsertLines,
    /// Whole lines were removed.
    RemoveLines,
}

/// A single structural change to the line buffer.
///
/// Ranges are expressed in the coordinates of the document *after* an insertion and
/// *before* a removal, so the covered text is always `text` / `lines`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delta {
    /// `text` was inserted at `range.start`; `range.end` is the position after it.
    InsertText {
        /// Covered range in the resulting document.
        range: Range,
        /// Inserted text.
        text: String,
    },
    /// The text covered by `range` was removed.
    RemoveText {
        /// Removed range in the original document.
        range: Range,
        /// Removed text, rows joined by the document newline.
        text: String,
    },
    /// `lines` were inserted before row `range.start.row`.
    ///
    /// The range is `(row, 0) -> (row + lines.len(), 0)`.
    InsertLines {
        /// Covered row range.
        range: Range,
        /// Inserted lines.
        lines: Vec<String>,
    },
    /// Rows `range.start.row..range.end.row` were removed.
    RemoveLines {
        /// Removed row range.
        range: Range,
        /// Removed lines.
        lines: Vec<String>,
    },
}

impl Delta {
    /// The kind of this delta.
    pub fn action(&self) -> DeltaAction {
        match self {
            Self::InsertText { .. } => DeltaAction::InsertText,
            Self::RemoveText { .. } => DeltaAction::RemoveText,
            Self::InsertLines { .. } => DeltaAction::InsertLines,
            Self::RemoveLines { .. } => DeltaAction::RemoveLines,
        }
    }

    /// The range this delta covers.
    pub fn range(&self) -> Range {
        match self {
            Self::InsertText { range, .. }
            | Self::RemoveText { range, .. }
            | Self::InsertLines { range, .. }
            | Self::RemoveLines { range, .. } => *range,
        }
    }

    /// Returns `true` for insertions.
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::InsertText { .. } | Self::InsertLines { .. })
    }

    /// Returns `true` for removals.
    pub fn is_remove(&self) -> bool {
        !self.is_insert()
    }

    /// Number of rows added (insertions) or removed (removals) by this delta.
    pub fn row_count(&self) -> usize {
        match self {
            Self::InsertLines { lines, .. } | Self::RemoveLines { lines, .. } => lines.len(),
            Self::InsertText { range, .. } | Self::RemoveText { range, .. } => {
                range.end.row - range.start.row
            }
        }
    }

    /// Where row `row` ends up after this delta, or `None` if its line was removed.
    ///
    /// Rows below the edited region move by [`row_count`](Self::row_count). An edit that
    /// starts at column 0 moves its start row too; otherwise the start row stays put and a
    /// removal merges the following rows into it.
    pub fn map_row(&self, row: usize) -> Option<usize> {
        let range = self.range();
        let len = range.end.row - range.start.row;
        if len == 0 {
            return Some(row);
        }
        let first = if range.start.column == 0 {
            range.start.row
        } else {
            range.start.row + 1
        };
        if self.is_insert() {
            Some(if row >= first { row + len } else { row })
        } else if row < first {
            Some(row)
        } else if row < first + len {
            None
        } else {
            Some(row - len)
        }
    }

    /// The delta that undoes this one.
    pub fn inverse(&self) -> Delta {
        match self.clone() {
            Self::InsertText { range, text } => Self::RemoveText { range, text },
            Self::RemoveText { range, text } => Self::InsertText { range, text },
            Self::InsertLines { range, lines } => Self::RemoveLines { range, lines },
            Self::RemoveLines { range, lines } => Self::InsertLines { range, lines },
        }
    }
}
