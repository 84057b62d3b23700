//! Compound edits built from the primitive ones.
//!
//! Everything here goes through `insert`/`remove`/`insert_lines`/`remove_lines`, so undo,
//! folds and caches see ordinary deltas. Folds inside moved text are re-added at the
//! destination.

use super::EditSession;
use crate::fold::Fold;
use crate::range::{Position, Range};
use regex::Regex;
use std::sync::LazyLock;

static TOKEN_CHAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{Mn}\p{Mc}\p{Nd}\p{Pc}$_]$").expect("valid token char regex")
});

static SPACE_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s$").expect("valid space char regex"));

fn matches_char(re: &Regex, c: char) -> bool {
    re.is_match(c.encode_utf8(&mut [0; 4]))
}

#[derive(Clone, Copy)]
enum CharClass {
    Token,
    Space,
    Other,
}

impl CharClass {
    fn matches(self, c: char) -> bool {
        match self {
            Self::Token => matches_char(&TOKEN_CHAR, c),
            Self::Space => matches_char(&SPACE_CHAR, c),
            Self::Other => !matches_char(&TOKEN_CHAR, c),
        }
    }
}

fn shift(value: usize, by: isize) -> usize {
    value.saturating_add_signed(by)
}

impl EditSession {
    /// Move (or copy) the text of `from` to `to`. Returns the range the text now occupies.
    ///
    /// `to` is given in coordinates from before the move. Folds inside `from` travel with
    /// the text.
    pub fn move_text(&mut self, from: Range, to: Position, copy: bool) -> Range {
        let text = self.doc.text_range(&from);
        let folds = self.folds_in_range(&from);
        let mut target = to;

        if !copy {
            self.remove(from);
            let row_diff = from.start.row as isize - from.end.row as isize;
            let col_diff = from.start.column as isize - from.end.column as isize;
            if col_diff != 0 && target.row == from.end.row && target.column > from.end.column {
                target.column = shift(target.column, col_diff);
            }
            if row_diff != 0 && target.row >= from.end.row {
                target.row = shift(target.row, row_diff);
            }
        }

        let end = self.insert(target, &text);
        if !folds.is_empty() {
            let row_diff = target.row as isize - from.start.row as isize;
            let col_diff = target.column as isize - from.start.column as isize;
            let moved: Vec<Fold> = folds
                .into_iter()
                .map(|mut fold| {
                    let range = &mut fold.range;
                    if range.start.row == from.start.row {
                        range.start.column = shift(range.start.column, col_diff);
                    }
                    if range.end.row == from.start.row {
                        range.end.column = shift(range.end.column, col_diff);
                    }
                    range.start.row = shift(range.start.row, row_diff);
                    range.end.row = shift(range.end.row, row_diff);
                    fold
                })
                .collect();
            self.add_folds(moved);
        }
        Range::from_points(target, end)
    }

    /// Prefix rows `start..=end` with `indent`; tabs in `indent` become the tab string.
    pub fn indent_rows(&mut self, start: usize, end: usize, indent: &str) {
        let indent = indent.replace('\t', &self.tab_string());
        for row in start..=end {
            self.insert(Position::new(row, 0), &indent);
        }
    }

    /// Remove one level of indentation from every row `range` touches.
    ///
    /// A level is a leading tab (after fewer than `tab_size` spaces) or up to `tab_size`
    /// leading spaces.
    pub fn outdent_rows(&mut self, range: &Range) {
        let rows = range.collapse_rows();
        let size = self.tab_size;
        for row in rows.start.row..=rows.end.row {
            let line: Vec<char> = self.doc.line(row).chars().take(size + 1).collect();
            let spaces = line.iter().take(size).take_while(|&&c| c == ' ').count();
            let remove = if spaces < size && line.get(spaces) == Some(&'\t') {
                Range::new(row, spaces, row, spaces + 1)
            } else {
                Range::new(row, 0, row, spaces)
            };
            self.remove(remove);
        }
    }

    fn move_lines(&mut self, first: usize, last: usize, dir: isize) -> isize {
        let mut first = self.row_fold_start(first);
        let mut last = self.row_fold_end(last);
        let diff = match dir.signum() {
            -1 => {
                let Some(above) = first.checked_sub(1) else {
                    return 0;
                };
                self.row_fold_start(above) as isize - first as isize
            }
            1 => {
                let below = self.row_fold_end(last + 1);
                if below > self.doc.last_row() {
                    return 0;
                }
                below as isize - last as isize
            }
            _ => {
                let max = self.doc.last_row();
                first = first.min(max);
                last = last.min(max);
                (last - first + 1) as isize
            }
        };

        let range = Range::new(first, 0, last, usize::MAX);
        let folds: Vec<Fold> = self
            .folds_in_range(&range)
            .into_iter()
            .map(|mut fold| {
                fold.shift_row(diff);
                fold
            })
            .collect();

        let lines = if dir == 0 {
            self.doc.lines(first, last).to_vec()
        } else {
            match self.remove_lines(first, last) {
                Ok(lines) => lines,
                Err(err) => {
                    tracing::debug!(%err, first, last, "lines not moved");
                    return 0;
                }
            }
        };
        self.insert_lines(shift(first, diff), &lines);
        if !folds.is_empty() {
            self.add_folds(folds);
        }
        diff
    }

    /// Move rows `first..=last` (widened to whole fold lines) up past the visual line
    /// above. Returns the row shift, 0 if nothing moved.
    pub fn move_lines_up(&mut self, first: usize, last: usize) -> isize {
        self.move_lines(first, last, -1)
    }

    /// Move rows `first..=last` down past the visual line below.
    pub fn move_lines_down(&mut self, first: usize, last: usize) -> isize {
        self.move_lines(first, last, 1)
    }

    /// Insert a copy of rows `first..=last` below them.
    pub fn duplicate_lines(&mut self, first: usize, last: usize) -> isize {
        self.move_lines(first, last, 0)
    }

    /// The word, whitespace run or punctuation run around `(row, column)`.
    pub fn word_range(&self, row: usize, column: usize) -> Range {
        let line: Vec<char> = self.doc.line(row).chars().collect();
        let is_token = |i: usize| line.get(i).is_some_and(|&c| CharClass::Token.matches(c));

        let in_token = (column > 0 && is_token(column - 1)) || is_token(column);
        let class = if in_token {
            CharClass::Token
        } else {
            let around = &line[column.saturating_sub(1).min(line.len())..(column + 1).min(line.len())];
            if !around.is_empty() && around.iter().all(|&c| CharClass::Space.matches(c)) {
                CharClass::Space
            } else {
                CharClass::Other
            }
        };
        let matches = |i: usize| line.get(i).is_some_and(|&c| class.matches(c));

        let mut start = column.min(line.len());
        while start > 0 && matches(start - 1) {
            start -= 1;
        }
        let mut end = column;
        while end < line.len() && matches(end) {
            end += 1;
        }
        Range::new(row, start, row, end.max(start))
    }

    /// [`word_range`](Self::word_range) extended over trailing spaces and tabs.
    pub fn a_word_range(&self, row: usize, column: usize) -> Range {
        let mut range = self.word_range(row, column);
        let line = self.doc.line(range.end.row);
        let trailing = line
            .chars()
            .skip(range.end.column)
            .take_while(|c| matches!(c, ' ' | '\t'))
            .count();
        range.end.column += trailing;
        range
    }
}
