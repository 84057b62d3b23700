//! Document positions and ranges.
//!
//! [`Position`] is a `(row, column)` pair where `column` counts Unicode scalar values (`char`s)
//! within the row. [`Range`] is an interval between two positions. Ranges are plain values:
//! every operation that "changes" a range returns a new one.
//!
//! Point comparisons follow a closed-interval convention: a point equal to `start` or `end`
//! is considered inside the range. The `compare_start`, `compare_end` and `compare_inside`
//! variants treat exact endpoints specially, which fold bookkeeping relies on.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A position in the document (zero-based row and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based row index.
    pub row: usize,
    /// Zero-based column in characters within the row.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

/// How one range relates to another, as seen from the range doing the comparison.
///
/// Produced by [`Range::compare_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeRelation {
    /// The other range ends before this one starts.
    DisjointBefore,
    /// The other range starts before this one and ends inside it.
    OverlapStart,
    /// The other range lies within this one, or covers it entirely.
    Nested,
    /// The other range starts inside this one and ends after it.
    OverlapEnd,
    /// The other range starts after this one ends.
    DisjointAfter,
    /// The other range's end is inside this range while its start lies after this range.
    ///
    /// Only reachable with a backwards range (`start > end`), such as the column-shrunk
    /// probe range used by fold lookups on a single-character span.
    EndInsideStartOutside,
}

impl RangeRelation {
    /// Returns `true` for the three overlapping relations.
    pub fn intersects(self) -> bool {
        matches!(self, Self::OverlapStart | Self::Nested | Self::OverlapEnd)
    }
}

/// An interval between two document positions.
///
/// Algorithms assume `start <= end`; callers may still build backwards ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    /// Range start.
    pub start: Position,
    /// Range end.
    pub end: Position,
}

impl Range {
    /// Create a range from explicit coordinates.
    pub const fn new(start_row: usize, start_column: usize, end_row: usize, end_column: usize) -> Self {
        Self {
            start: Position::new(start_row, start_column),
            end: Position::new(end_row, end_column),
        }
    }

    /// Create a range from two positions.
    pub const fn from_points(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create an empty range at `pos`.
    pub const fn at(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }

    /// Returns `true` if both ranges have identical endpoints.
    pub fn is_equal(&self, other: &Range) -> bool {
        self == other
    }

    /// Returns `true` if `start == end`.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if the range spans more than one row.
    pub fn is_multi_line(&self) -> bool {
        self.start.row != self.end.row
    }

    /// Returns `true` if `(row, column)` equals the start position.
    pub fn is_start(&self, row: usize, column: usize) -> bool {
        self.start.row == row && self.start.column == column
    }

    /// Returns `true` if `(row, column)` equals the end position.
    pub fn is_end(&self, row: usize, column: usize) -> bool {
        self.end.row == row && self.end.column == column
    }

    /// Compare a point against this range.
    ///
    /// Returns `Less` if the point is before the range, `Greater` if it is after the range,
    /// and `Equal` if it lies within it (endpoints included).
    pub fn compare(&self, row: usize, column: usize) -> Ordering {
        if !self.is_multi_line() && row == self.start.row {
            return if column < self.start.column {
                Ordering::Less
            } else if column > self.end.column {
                Ordering::Greater
            } else {
                Ordering::Equal
            };
        }

        if row < self.start.row {
            return Ordering::Less;
        }
        if row > self.end.row {
            return Ordering::Greater;
        }
        if self.start.row == row {
            return if column >= self.start.column {
                Ordering::Equal
            } else {
                Ordering::Less
            };
        }
        if self.end.row == row {
            return if column <= self.end.column {
                Ordering::Equal
            } else {
                Ordering::Greater
            };
        }
        Ordering::Equal
    }

    /// [`compare`](Self::compare) for a [`Position`].
    pub fn compare_point(&self, point: Position) -> Ordering {
        self.compare(point.row, point.column)
    }

    /// Like [`compare`](Self::compare), but a point equal to `start` counts as before.
    pub fn compare_start(&self, row: usize, column: usize) -> Ordering {
        if self.is_start(row, column) {
            Ordering::Less
        } else {
            self.compare(row, column)
        }
    }

    /// Like [`compare`](Self::compare), but a point equal to `end` counts as after.
    pub fn compare_end(&self, row: usize, column: usize) -> Ordering {
        if self.is_end(row, column) {
            Ordering::Greater
        } else {
            self.compare(row, column)
        }
    }

    /// Like [`compare`](Self::compare), but both endpoints count as outside.
    pub fn compare_inside(&self, row: usize, column: usize) -> Ordering {
        if self.is_end(row, column) {
            Ordering::Greater
        } else if self.is_start(row, column) {
            Ordering::Less
        } else {
            self.compare(row, column)
        }
    }

    /// Classify how `other` relates to this range.
    pub fn compare_range(&self, other: &Range) -> RangeRelation {
        match self.compare_point(other.end) {
            Ordering::Greater => match self.compare_point(other.start) {
                Ordering::Greater => RangeRelation::DisjointAfter,
                Ordering::Equal => RangeRelation::OverlapEnd,
                Ordering::Less => RangeRelation::Nested,
            },
            Ordering::Less => RangeRelation::DisjointBefore,
            Ordering::Equal => match self.compare_point(other.start) {
                Ordering::Less => RangeRelation::OverlapStart,
                Ordering::Greater => RangeRelation::EndInsideStartOutside,
                Ordering::Equal => RangeRelation::Nested,
            },
        }
    }

    /// Returns `true` if `(row, column)` lies within the range (endpoints included).
    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.compare(row, column) == Ordering::Equal
    }

    /// Returns `true` if both endpoints of `other` lie within this range.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.compare_point(other.start) == Ordering::Equal
            && self.compare_point(other.end) == Ordering::Equal
    }

    /// Returns `true` if the two ranges overlap.
    pub fn intersects(&self, other: &Range) -> bool {
        self.compare_range(other).intersects()
    }

    /// Returns `true` if the point lies strictly inside the range.
    pub fn inside(&self, row: usize, column: usize) -> bool {
        self.contains(row, column) && !self.is_end(row, column) && !self.is_start(row, column)
    }

    /// Returns `true` if the point lies inside the range or on its start.
    pub fn inside_start(&self, row: usize, column: usize) -> bool {
        self.contains(row, column) && !self.is_end(row, column)
    }

    /// Returns `true` if the point lies inside the range or on its end.
    pub fn inside_end(&self, row: usize, column: usize) -> bool {
        self.contains(row, column) && !self.is_start(row, column)
    }

    /// Clamp the range rows to `first_row..=last_row`.
    ///
    /// Endpoints past `last_row` move to `(last_row + 1, 0)`; endpoints before `first_row`
    /// move to `(first_row, 0)`.
    pub fn clip_rows(&self, first_row: usize, last_row: usize) -> Range {
        let clip = |p: Position| {
            if p.row > last_row {
                Position::new(last_row + 1, 0)
            } else if p.row < first_row {
                Position::new(first_row, 0)
            } else {
                p
            }
        };
        Range::from_points(clip(self.start), clip(self.end))
    }

    /// Grow the range so it covers `(row, column)`.
    pub fn extend(&self, row: usize, column: usize) -> Range {
        match self.compare(row, column) {
            Ordering::Equal => *self,
            Ordering::Less => Range::from_points(Position::new(row, column), self.end),
            Ordering::Greater => Range::from_points(self.start, Position::new(row, column)),
        }
    }

    /// Whole-row range covering the rows touched by this range.
    ///
    /// A range ending at column 0 does not include its end row.
    pub fn collapse_rows(&self) -> Range {
        if self.end.column == 0 {
            Range::new(
                self.start.row,
                0,
                self.start.row.max(self.end.row.saturating_sub(1)),
                0,
            )
        } else {
            Range::new(self.start.row, 0, self.end.row, 0)
        }
    }

    /// A copy of this range translated by `(rows, columns)`, saturating at zero.
    pub fn move_by(&self, rows: isize, columns: isize) -> Range {
        let shift = |p: Position| {
            Position::new(
                p.row.saturating_add_signed(rows),
                p.column.saturating_add_signed(columns),
            )
        };
        Range::from_points(shift(self.start), shift(self.end))
    }

    /// Row-major comparison of two points.
    pub fn compare_points(a: Position, b: Position) -> Ordering {
        a.cmp(&b)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range: [{}/{}] -> [{}/{}]",
            self.start.row, self.start.column, self.end.row, self.end.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 0) > Position::new(0, 10));
        assert!(Position::new(1, 2) < Position::new(1, 3));
        assert_eq!(
            Range::compare_points(Position::new(2, 2), Position::new(2, 2)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_single_line() {
        let r = Range::new(1, 4, 1, 8);
        assert_eq!(r.compare(1, 3), Ordering::Less);
        assert_eq!(r.compare(1, 4), Ordering::Equal);
        assert_eq!(r.compare(1, 8), Ordering::Equal);
        assert_eq!(r.compare(1, 9), Ordering::Greater);
        assert_eq!(r.compare(0, 100), Ordering::Less);
        assert_eq!(r.compare(2, 0), Ordering::Greater);
    }

    #[test]
    fn test_compare_multi_line() {
        let r = Range::new(1, 4, 3, 2);
        assert_eq!(r.compare(1, 3), Ordering::Less);
        assert_eq!(r.compare(2, 0), Ordering::Equal);
        assert_eq!(r.compare(2, 1000), Ordering::Equal);
        assert_eq!(r.compare(3, 2), Ordering::Equal);
        assert_eq!(r.compare(3, 3), Ordering::Greater);
    }

    #[test]
    fn test_compare_endpoint_variants() {
        let r = Range::new(0, 2, 0, 6);
        assert_eq!(r.compare_start(0, 2), Ordering::Less);
        assert_eq!(r.compare_start(0, 6), Ordering::Equal);
        assert_eq!(r.compare_end(0, 6), Ordering::Greater);
        assert_eq!(r.compare_end(0, 2), Ordering::Equal);
        assert_eq!(r.compare_inside(0, 2), Ordering::Less);
        assert_eq!(r.compare_inside(0, 6), Ordering::Greater);
        assert_eq!(r.compare_inside(0, 4), Ordering::Equal);
    }

    #[test]
    fn test_compare_range_relations() {
        let r = Range::new(2, 0, 4, 0);
        assert_eq!(
            r.compare_range(&Range::new(0, 0, 1, 0)),
            RangeRelation::DisjointBefore
        );
        assert_eq!(
            r.compare_range(&Range::new(1, 0, 3, 0)),
            RangeRelation::OverlapStart
        );
        assert_eq!(r.compare_range(&Range::new(2, 5, 3, 0)), RangeRelation::Nested);
        assert_eq!(r.compare_range(&Range::new(0, 0, 9, 0)), RangeRelation::Nested);
        assert_eq!(
            r.compare_range(&Range::new(3, 0, 6, 0)),
            RangeRelation::OverlapEnd
        );
        assert_eq!(
            r.compare_range(&Range::new(5, 0, 6, 0)),
            RangeRelation::DisjointAfter
        );
    }

    #[test]
    fn test_backwards_range_reports_end_inside_start_outside() {
        let r = Range::new(0, 2, 0, 4);
        // A collapsed-and-shrunk probe: start moved past end.
        let probe = Range::new(0, 5, 0, 3);
        assert_eq!(
            r.compare_range(&probe),
            RangeRelation::EndInsideStartOutside
        );
        assert!(!r.intersects(&probe));
    }

    #[test]
    fn test_inside_variants() {
        let r = Range::new(0, 0, 0, 3);
        assert!(!r.inside(0, 0));
        assert!(r.inside(0, 1));
        assert!(r.inside_start(0, 0));
        assert!(!r.inside_start(0, 3));
        assert!(r.inside_end(0, 3));
        assert!(!r.inside_end(0, 0));
    }

    #[test]
    fn test_clip_extend_collapse_move() {
        let r = Range::new(1, 3, 8, 2);
        assert_eq!(r.clip_rows(2, 5), Range::new(2, 0, 6, 0));
        assert_eq!(r.extend(0, 1), Range::new(0, 1, 8, 2));
        assert_eq!(r.extend(9, 0), Range::new(1, 3, 9, 0));
        assert_eq!(r.extend(4, 4), r);
        assert_eq!(Range::new(1, 3, 4, 0).collapse_rows(), Range::new(1, 0, 3, 0));
        assert_eq!(Range::new(1, 3, 1, 0).collapse_rows(), Range::new(1, 0, 1, 0));
        assert_eq!(Range::new(1, 3, 4, 2).collapse_rows(), Range::new(1, 0, 4, 0));
        assert_eq!(r.move_by(-1, 2), Range::new(0, 5, 7, 4));
        assert_eq!(r, Range::new(1, 3, 8, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Range::new(0, 1, 2, 3).to_string(), "Range: [0/1] -> [2/3]");
    }
}
