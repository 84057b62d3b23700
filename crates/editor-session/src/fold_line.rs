//! Fold lines: runs of folds that share a visual row.
//!
//! Folds that touch (one ends on the row where the next begins) render as a single screen
//! line. A [`FoldLine`] owns such a run, sorted by position, and tracks the span from the
//! first fold's start to the last fold's end.

use crate::error::{Result, SessionError};
use crate::fold::Fold;
use crate::range::{Position, Range};
use crate::text::char_len;
use std::cmp::Ordering;
use std::fmt;

/// Where a point lies relative to the fold returned by [`FoldLine::next_fold_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldSide {
    /// The point is before the fold.
    After,
    /// The point is inside the fold (its end excluded).
    Inside,
}

/// A sorted run of folds rendered on one visual row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldLine {
    folds: Vec<Fold>,
    range: Range,
}

impl FoldLine {
    /// Create a fold line holding a single fold.
    pub fn new(fold: Fold) -> Self {
        Self {
            range: fold.range,
            folds: vec![fold],
        }
    }

    /// Create a fold line from folds that are already sorted and connected.
    ///
    /// Returns `None` when `folds` is empty.
    pub(crate) fn from_folds(folds: Vec<Fold>) -> Option<Self> {
        let start = folds.first()?.range.start;
        let end = folds.last()?.range.end;
        Some(Self {
            folds,
            range: Range::from_points(start, end),
        })
    }

    /// The folds in document order.
    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    pub(crate) fn folds_mut(&mut self) -> &mut Vec<Fold> {
        &mut self.folds
    }

    /// Span from the first fold's start to the last fold's end.
    pub fn range(&self) -> Range {
        self.range
    }

    /// Start of the first fold.
    pub fn start(&self) -> Position {
        self.range.start
    }

    /// End of the last fold.
    pub fn end(&self) -> Position {
        self.range.end
    }

    /// Returns `true` if `row` is covered by this fold line.
    pub fn contains_row(&self, row: usize) -> bool {
        row >= self.range.start.row && row <= self.range.end.row
    }

    /// Recompute the span after folds were removed from the ends.
    pub(crate) fn refresh_range(&mut self) {
        if let (Some(first), Some(last)) = (self.folds.first(), self.folds.last()) {
            self.range = Range::from_points(first.range.start, last.range.end);
        }
    }

    /// Move the whole line (and every fold in it) by `rows`.
    pub fn shift_row(&mut self, rows: isize) {
        self.range = self.range.move_by(rows, 0);
        for fold in &mut self.folds {
            fold.shift_row(rows);
        }
    }

    /// Add a fold that is connected to this line.
    ///
    /// A single-row fold must lie within the line's rows. A multi-row fold must start on the
    /// line's last row or end on its first row.
    pub fn add_fold(&mut self, fold: Fold) -> Result<()> {
        let (start, end) = (fold.range.start, fold.range.end);
        if fold.same_row() {
            if start.row < self.range.start.row || end.row > self.range.end.row {
                return Err(SessionError::FoldLineDisconnected { range: fold.range });
            }
            self.folds.push(fold);
            self.folds.sort_by(|a, b| a.range.start.cmp(&b.range.start));
            if self.range.compare_end(start.row, start.column) == Ordering::Greater {
                self.range.end = end;
            } else if self.range.compare_start(end.row, end.column) == Ordering::Less {
                self.range.start = start;
            }
        } else if start.row == self.range.end.row {
            self.folds.push(fold);
            self.range.end = end;
        } else if end.row == self.range.start.row {
            self.folds.insert(0, fold);
            self.range.start = start;
        } else {
            return Err(SessionError::FoldLineDisconnected { range: fold.range });
        }
        Ok(())
    }

    /// Walk the line's text segments and placeholders in order.
    ///
    /// The callback receives `(placeholder, row, column, last_column, is_new_row)`. Text
    /// segments are reported with `placeholder == None` and span `last_column..column` (on
    /// `row` when `is_new_row` is false). Placeholders are reported at their fold's start.
    /// Returning `true` from the callback stops the walk. The walk ends at
    /// `(end_row, end_column)`, or at the line end when `end` is `None`.
    pub fn walk<F>(&self, mut callback: F, end: Option<Position>)
    where
        F: FnMut(Option<&str>, usize, usize, usize, bool) -> bool,
    {
        let end = end.unwrap_or(self.range.end);
        let mut last_end = 0;
        let mut is_new_row = true;

        for fold in &self.folds {
            let cmp = fold.range.compare_start(end.row, end.column);
            if cmp == Ordering::Less {
                callback(None, end.row, end.column, last_end, is_new_row);
                return;
            }

            let (row, column) = (fold.range.start.row, fold.range.start.column);
            if callback(None, row, column, last_end, is_new_row) {
                return;
            }
            if callback(Some(&fold.placeholder), row, column, last_end, false) {
                return;
            }
            if cmp == Ordering::Equal {
                return;
            }

            is_new_row = !fold.same_row();
            last_end = fold.range.end.column;
        }
        callback(None, end.row, end.column, last_end, is_new_row);
    }

    /// The first fold whose end lies after `(row, column)`.
    pub fn next_fold_to(&self, row: usize, column: usize) -> Option<(usize, FoldSide)> {
        self.folds
            .iter()
            .enumerate()
            .find_map(|(i, fold)| match fold.range.compare_end(row, column) {
                Ordering::Less => Some((i, FoldSide::After)),
                Ordering::Equal => Some((i, FoldSide::Inside)),
                Ordering::Greater => None,
            })
    }

    /// Shift fold columns after a same-row edit of `len` characters at `(row, column)`.
    ///
    /// Folds starting on `row` at or after the edit move by `len`; the shift stops at the
    /// first multi-row fold, whose end lives on another row.
    pub fn add_remove_chars(&mut self, row: usize, column: usize, len: isize) {
        let Some((index, side)) = self.next_fold_to(row, column) else {
            return;
        };
        let first = &self.folds[index];
        if side == FoldSide::Inside
            && first.range.start.column != column
            && first.range.start.row != row
        {
            tracing::debug!(
                "FoldLine.add_remove_chars: edit at ({}, {}) lands inside {}",
                row,
                column,
                first
            );
            return;
        }
        if first.range.start.row != row {
            return;
        }

        if index == 0 {
            self.range.start.column = self.range.start.column.saturating_add_signed(len);
        }
        for fold in &mut self.folds[index..] {
            fold.range.start.column = fold.range.start.column.saturating_add_signed(len);
            if !fold.same_row() {
                return;
            }
            fold.range.end.column = fold.range.end.column.saturating_add_signed(len);
        }
        self.range.end.column = self.range.end.column.saturating_add_signed(len);
    }

    /// Split the line before the first fold ending after `(row, column)`.
    ///
    /// `self` keeps the folds before the split point and the returned line holds the rest.
    /// A point on a fold's start splits before that fold. Returns `None` (leaving `self`
    /// untouched) when the point is strictly inside a fold, after the last fold, or before
    /// the first one.
    pub fn split(&mut self, row: usize, column: usize) -> Option<FoldLine> {
        let (index, side) = self.next_fold_to(row, column)?;
        if index == 0 {
            return None;
        }
        if side == FoldSide::Inside && !self.folds[index].range.is_start(row, column) {
            return None;
        }
        let tail = self.folds.split_off(index);
        self.range.end = self.folds[index - 1].range.end;
        FoldLine::from_folds(tail)
    }

    /// Append every fold of `next` to this line.
    pub fn merge(&mut self, next: FoldLine) -> Result<()> {
        for fold in next.folds {
            self.add_fold(fold)?;
        }
        Ok(())
    }

    /// Map a column in the line's display string back to a document position.
    ///
    /// Columns inside a placeholder resolve to the fold's start.
    pub fn idx_to_position(&self, idx: usize) -> Position {
        let mut idx = idx as isize;
        let mut last_fold_end_column = 0isize;
        for fold in &self.folds {
            let start = fold.range.start;
            idx -= start.column as isize - last_fold_end_column;
            if idx < 0 {
                return Position::new(start.row, start.column.saturating_add_signed(idx));
            }
            idx -= char_len(&fold.placeholder) as isize;
            if idx < 0 {
                return start;
            }
            last_fold_end_column = fold.range.end.column as isize;
        }
        Position::new(
            self.range.end.row,
            self.range.end.column.saturating_add_signed(idx),
        )
    }
}

impl fmt::Display for FoldLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [", self.range)?;
        for (i, fold) in self.folds.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{fold}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(sr: usize, sc: usize, er: usize, ec: usize) -> Fold {
        Fold::new(Range::new(sr, sc, er, ec), "...")
    }

    #[test]
    fn test_add_fold_extends_both_ways() {
        let mut line = FoldLine::new(fold(2, 4, 4, 1));
        line.add_fold(fold(4, 3, 6, 0)).unwrap();
        line.add_fold(fold(0, 1, 2, 2)).unwrap();
        assert_eq!(line.range(), Range::new(0, 1, 6, 0));
        assert_eq!(line.folds().len(), 3);
        assert_eq!(line.folds()[0].range.start, Position::new(0, 1));
    }

    #[test]
    fn test_add_same_row_fold_keeps_order() {
        let mut line = FoldLine::new(fold(1, 10, 1, 14));
        line.add_fold(fold(1, 2, 1, 5)).unwrap();
        assert_eq!(line.range(), Range::new(1, 2, 1, 14));
        assert_eq!(line.folds()[0].range, Range::new(1, 2, 1, 5));
        line.add_fold(fold(1, 20, 1, 22)).unwrap();
        assert_eq!(line.end(), Position::new(1, 22));
    }

    #[test]
    fn test_add_disconnected_fold_fails() {
        let mut line = FoldLine::new(fold(2, 0, 3, 0));
        assert!(matches!(
            line.add_fold(fold(5, 0, 7, 0)),
            Err(SessionError::FoldLineDisconnected { .. })
        ));
        assert!(line.add_fold(fold(6, 0, 6, 3)).is_err());
    }

    #[test]
    fn test_shift_row() {
        let mut line = FoldLine::new(fold(2, 1, 3, 4));
        line.shift_row(3);
        assert_eq!(line.range(), Range::new(5, 1, 6, 4));
        assert_eq!(line.folds()[0].range, Range::new(5, 1, 6, 4));
        line.shift_row(-5);
        assert_eq!(line.start().row, 0);
    }

    #[test]
    fn test_walk_collects_display_text() {
        let text = ["ab{cd", "ef}gh{ij", "kl}mn"];
        let mut line = FoldLine::new(Fold::new(Range::new(0, 3, 1, 2), "A"));
        line.add_fold(Fold::new(Range::new(1, 6, 2, 2), "B")).unwrap();

        let mut out = String::new();
        line.walk(
            |placeholder, row, column, last_column, _| {
                match placeholder {
                    Some(p) => out.push_str(p),
                    None => {
                        let chars: Vec<char> = text[row].chars().collect();
                        let from = last_column.min(column);
                        out.extend(&chars[from..column.min(chars.len())]);
                    }
                }
                false
            },
            Some(Position::new(2, 5)),
        );
        assert_eq!(out, "ab{A}gh{B}mn");
    }

    #[test]
    fn test_walk_stops_when_requested() {
        let line = FoldLine::new(fold(0, 2, 1, 0));
        let mut calls = 0;
        line.walk(
            |_, _, _, _, _| {
                calls += 1;
                true
            },
            None,
        );
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_add_remove_chars_shifts_following_same_row_folds() {
        let mut line = FoldLine::new(fold(0, 4, 0, 8));
        line.add_fold(fold(0, 10, 2, 1)).unwrap();
        line.add_remove_chars(0, 1, 3);
        assert_eq!(line.folds()[0].range, Range::new(0, 7, 0, 11));
        assert_eq!(line.folds()[1].range, Range::new(0, 13, 2, 1));
        assert_eq!(line.range(), Range::new(0, 7, 2, 1));
    }

    #[test]
    fn test_split_between_folds() {
        let mut line = FoldLine::new(fold(0, 4, 1, 2));
        line.add_fold(fold(1, 5, 3, 0)).unwrap();
        let tail = line.split(1, 3).unwrap();
        assert_eq!(line.range(), Range::new(0, 4, 1, 2));
        assert_eq!(tail.range(), Range::new(1, 5, 3, 0));
        assert!(line.split(0, 5).is_none());
    }

    #[test]
    fn test_split_on_fold_start() {
        let mut line = FoldLine::new(fold(0, 4, 1, 2));
        line.add_fold(fold(1, 5, 3, 0)).unwrap();
        let tail = line.split(1, 5).unwrap();
        assert_eq!(tail.folds().len(), 1);
        assert_eq!(line.end(), Position::new(1, 2));
        assert!(line.split(0, 4).is_none());
    }

    #[test]
    fn test_merge() {
        let mut a = FoldLine::new(fold(0, 4, 1, 2));
        let b = FoldLine::new(fold(1, 5, 3, 0));
        a.merge(b).unwrap();
        assert_eq!(a.range(), Range::new(0, 4, 3, 0));
        assert_eq!(a.folds().len(), 2);
    }

    #[test]
    fn test_idx_to_position() {
        // "ab{" + "..." + "}cd" with the fold covering (0,3)..(2,0)
        let line = FoldLine::new(fold(0, 3, 2, 0));
        assert_eq!(line.idx_to_position(1), Position::new(0, 1));
        assert_eq!(line.idx_to_position(4), Position::new(0, 3));
        assert_eq!(line.idx_to_position(6), Position::new(2, 0));
        assert_eq!(line.idx_to_position(8), Position::new(2, 2));
    }
}
