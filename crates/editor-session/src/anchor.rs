//! Positions that follow document edits.

use crate::delta::Delta;
use crate::range::Position;

/// A document position that is moved by deltas so it keeps pointing at the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Current row.
    pub row: usize,
    /// Current column.
    pub column: usize,
    /// When set, text inserted exactly at the anchor does not push it to the right.
    pub insert_right: bool,
}

impl Anchor {
    /// Create an anchor at `pos`.
    pub fn new(pos: Position) -> Self {
        Self {
            row: pos.row,
            column: pos.column,
            insert_right: false,
        }
    }

    /// Current position.
    pub fn position(&self) -> Position {
        Position::new(self.row, self.column)
    }

    /// Move the anchor according to `delta`.
    pub fn apply_delta(&mut self, delta: &Delta) {
        let range = delta.range();
        let (start, end) = (range.start, range.end);

        if start.row == end.row && start.row != self.row {
            return;
        }
        if start.row > self.row {
            return;
        }
        if start.row == self.row && start.column > self.column {
            return;
        }

        let mut row = self.row;
        let mut column = self.column;

        match delta {
            Delta::InsertText { .. } => {
                if start.row == row && start.column <= column {
                    if start.column == column && self.insert_right {
                        // stays put
                    } else if start.row == end.row {
                        column += end.column - start.column;
                    } else {
                        column = column - start.column + end.column;
                        row += end.row - start.row;
                    }
                } else if start.row != end.row && start.row < row {
                    row += end.row - start.row;
                }
            }
            Delta::InsertLines { .. } => {
                if start.row == row && column == 0 && self.insert_right {
                    // stays put
                } else if start.row <= row {
                    row += end.row - start.row;
                }
            }
            Delta::RemoveText { .. } => {
                if start.row == row && start.column < column {
                    if end.row > row || end.column >= column {
                        column = start.column;
                    } else {
                        column = column.saturating_sub(end.column - start.column);
                    }
                } else if start.row != end.row && start.row < row {
                    if end.row == row {
                        column = column.saturating_sub(end.column) + start.column;
                    } else if end.row > row {
                        column = start.column;
                        row = end.row;
                    }
                    row -= end.row - start.row;
                } else if end.row == row {
                    row -= end.row - start.row;
                    column = column.saturating_sub(end.column) + start.column;
                }
            }
            Delta::RemoveLines { .. } => {
                if start.row <= row {
                    if end.row <= row {
                        row -= end.row - start.row;
                    } else {
                        row = start.row;
                        column = 0;
                    }
                }
            }
        }

        self.row = row;
        self.column = column;
    }
}
