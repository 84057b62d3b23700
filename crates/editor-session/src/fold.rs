//! Folds: collapsed document ranges shown as a placeholder string.
//!
//! A [`Fold`] owns the folds that were nested inside it when it was created. Those children
//! are stored relative to the parent's start position, so they survive edits that shift the
//! parent, and are restored to absolute coordinates when the parent is expanded.

use crate::error::{Result, SessionError};
use crate::range::{Position, Range};
use std::cmp::Ordering;
use std::fmt;

/// A collapsed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// The folded document range (absolute for top-level folds).
    pub range: Range,
    /// Text displayed instead of the folded range.
    pub placeholder: String,
    /// Nested folds, relative to `range.start`.
    pub sub_folds: Vec<Fold>,
    /// Depth to re-collapse children to when this fold is expanded.
    pub collapse_children: usize,
}

impl Fold {
    /// Create a fold without children.
    pub fn new(range: Range, placeholder: impl Into<String>) -> Self {
        Self {
            range,
            placeholder: placeholder.into(),
            sub_folds: Vec::new(),
            collapse_children: 0,
        }
    }

    /// Fold start.
    pub fn start(&self) -> Position {
        self.range.start
    }

    /// Fold end.
    pub fn end(&self) -> Position {
        self.range.end
    }

    /// Returns `true` if the fold starts and ends on the same row.
    pub fn same_row(&self) -> bool {
        self.range.start.row == self.range.end.row
    }

    /// Nest `fold` (given in the same coordinates as `self.range`) inside this fold.
    ///
    /// Adding a fold equal to this one is a no-op. The fold must lie within this fold and
    /// must not partially overlap an existing child; existing children it covers become its
    /// own children.
    pub fn add_sub_fold(&mut self, mut fold: Fold) -> Result<()> {
        if self.range == fold.range {
            return Ok(());
        }
        if !self.range.contains_range(&fold.range) {
            return Err(SessionError::SubFoldOverlap { range: fold.range });
        }
        fold.range = consume_range(fold.range, self.range.start);
        self.insert_relative(fold)
    }

    /// Insert a child already expressed relative to this fold's start.
    fn insert_relative(&mut self, fold: Fold) -> Result<()> {
        let start = fold.range.start;
        let mut i = 0;
        let mut cmp = Ordering::Less;
        while i < self.sub_folds.len() {
            cmp = self.sub_folds[i].range.compare(start.row, start.column);
            if cmp != Ordering::Greater {
                break;
            }
            i += 1;
        }
        if i < self.sub_folds.len() && cmp == Ordering::Equal {
            return self.sub_folds[i].add_sub_fold(fold);
        }

        let end = fold.range.end;
        let mut j = i;
        cmp = Ordering::Less;
        while j < self.sub_folds.len() {
            cmp = self.sub_folds[j].range.compare(end.row, end.column);
            if cmp != Ordering::Greater {
                break;
            }
            j += 1;
        }
        if j < self.sub_folds.len() && cmp == Ordering::Equal {
            let range = restore_range(fold.range, self.range.start);
            return Err(SessionError::SubFoldOverlap { range });
        }

        let mut fold = fold;
        let covered: Vec<Fold> = self.sub_folds.drain(i..j).collect();
        for mut child in covered {
            child.range = consume_range(child.range, fold.range.start);
            fold.insert_relative(child)?;
        }
        self.sub_folds.insert(i, fold);
        Ok(())
    }

    /// Children converted back to absolute coordinates.
    pub fn restored_sub_folds(&self) -> Vec<Fold> {
        self.sub_folds
            .iter()
            .map(|sub| {
                let mut sub = sub.clone();
                sub.range = restore_range(sub.range, self.range.start);
                sub
            })
            .collect()
    }

    /// Shift the fold by `rows`.
    pub(crate) fn shift_row(&mut self, rows: isize) {
        self.range.start.row = self.range.start.row.saturating_add_signed(rows);
        self.range.end.row = self.range.end.row.saturating_add_signed(rows);
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.placeholder, self.range)
    }
}

fn consume_point(point: Position, anchor: Position) -> Position {
    let row = point.row - anchor.row;
    let column = if row == 0 {
        point.column - anchor.column
    } else {
        point.column
    };
    Position::new(row, column)
}

/// Express `range` relative to `anchor`. `range` must not start before `anchor`.
pub(crate) fn consume_range(range: Range, anchor: Position) -> Range {
    Range::from_points(
        consume_point(range.start, anchor),
        consume_point(range.end, anchor),
    )
}

fn restore_point(point: Position, anchor: Position) -> Position {
    let column = if point.row == 0 {
        point.column + anchor.column
    } else {
        point.column
    };
    Position::new(point.row + anchor.row, column)
}

/// Inverse of [`consume_range`].
pub(crate) fn restore_range(range: Range, anchor: Position) -> Range {
    Range::from_points(
        restore_point(range.start, anchor),
        restore_point(range.end, anchor),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_restore_roundtrip() {
        let anchor = Position::new(3, 4);
        let r = Range::new(3, 6, 5, 2);
        let local = consume_range(r, anchor);
        assert_eq!(local, Range::new(0, 2, 2, 2));
        assert_eq!(restore_range(local, anchor), r);
    }

    #[test]
    fn test_add_sub_fold_stores_relative() {
        let mut parent = Fold::new(Range::new(1, 4, 6, 1), "...");
        parent
            .add_sub_fold(Fold::new(Range::new(2, 3, 3, 0), "{}"))
            .unwrap();
        assert_eq!(parent.sub_folds[0].range, Range::new(1, 3, 2, 0));
        assert_eq!(
            parent.restored_sub_folds()[0].range,
            Range::new(2, 3, 3, 0)
        );
    }

    #[test]
    fn test_add_sub_fold_rejects_outside_and_overlap() {
        let mut parent = Fold::new(Range::new(0, 0, 10, 0), "...");
        assert!(matches!(
            parent.add_sub_fold(Fold::new(Range::new(9, 0, 11, 0), "x")),
            Err(SessionError::SubFoldOverlap { .. })
        ));
        parent
            .add_sub_fold(Fold::new(Range::new(2, 0, 4, 0), "a"))
            .unwrap();
        assert!(matches!(
            parent.add_sub_fold(Fold::new(Range::new(3, 0, 6, 0), "b")),
            Err(SessionError::SubFoldOverlap { .. })
        ));
    }

    #[test]
    fn test_add_sub_fold_equal_is_noop() {
        let mut parent = Fold::new(Range::new(0, 0, 3, 0), "...");
        parent
            .add_sub_fold(Fold::new(Range::new(0, 0, 3, 0), "..."))
            .unwrap();
        assert!(parent.sub_folds.is_empty());
    }

    #[test]
    fn test_covering_sub_fold_adopts_children() {
        let mut parent = Fold::new(Range::new(0, 0, 10, 0), "...");
        parent
            .add_sub_fold(Fold::new(Range::new(3, 1, 3, 5), "a"))
            .unwrap();
        parent
            .add_sub_fold(Fold::new(Range::new(2, 0, 5, 0), "b"))
            .unwrap();
        assert_eq!(parent.sub_folds.len(), 1);
        let b = &parent.sub_folds[0];
        assert_eq!(b.placeholder, "b");
        assert_eq!(b.sub_folds.len(), 1);
        assert_eq!(b.sub_folds[0].range, Range::new(1, 1, 1, 5));
    }

    #[test]
    fn test_display() {
        let f = Fold::new(Range::new(0, 1, 0, 5), "..");
        assert_eq!(f.to_string(), "\"..\" Range: [0/1] -> [0/5]");
    }
}
