//! Document/screen coordinate conversion.
//!
//! Both directions walk visual lines from the nearest [`RowCache`] entry, adding up row
//! heights. A fold line is one visual line; soft wrap and line widgets add screen rows to
//! the visual line they belong to. Walks that start at the end of the cache append what they
//! visit, so the cache stays a prefix of the walk from row 0.

use super::{EditSession, FoldEdge};
use crate::layout::string_screen_width;
use crate::range::{Position, Range};
use crate::row_cache::RowCache;
use crate::text::{char_len, slice_from, slice_to};

impl EditSession {
    /// Screen rows taken by `row`: wrapped rows plus line widget rows.
    ///
    /// For the first row of a fold line, the widget shown is its own or, failing that, the
    /// one on the fold line's last row. Other rows hidden by a fold have no widget rows.
    pub fn row_length(&self, row: usize) -> usize {
        let widget_rows = match self.fold_line(row) {
            Some(line) if line.start().row == row => {
                match self.line_widgets.row_count(row) {
                    0 => self.line_widgets.row_count(line.end().row),
                    own => own,
                }
            }
            Some(_) => 0,
            None => self.line_widgets.row_count(row),
        };
        self.row_line_count(row) + widget_rows
    }

    /// Screen rows taken by the text of `row`, ignoring line widgets.
    pub fn row_line_count(&self, row: usize) -> usize {
        if !self.use_wrap_mode {
            return 1;
        }
        self.wrap_data.get(row).map_or(1, |splits| splits.len() + 1)
    }

    /// Total number of screen rows.
    pub fn screen_length(&self) -> usize {
        let rows = self.doc.len();
        let mut total = 0;
        let mut row = 0;
        let mut next_line = 0;
        while row < rows {
            total += self.row_length(row);
            match self.fold_lines.get(next_line) {
                Some(line) if line.start().row == row => {
                    row = line.end().row + 1;
                    next_line += 1;
                }
                _ => row += 1,
            }
        }
        total
    }

    /// Convert a screen position to a document position.
    ///
    /// Positions past the last screen row resolve to the end of the document; columns past
    /// the end of a screen row resolve to its last document column. A screen column on a
    /// fold placeholder resolves to the fold's start.
    pub fn screen_to_document_position(&mut self, screen_row: usize, screen_column: usize) -> Position {
        let cached = self.row_cache.lookup_screen(screen_row);
        let mut row = cached.entry.screen_row;
        let mut doc_row = cached.entry.doc_row;
        let max_row = self.doc.last_row();

        let mut fold_index = self.next_fold_line_index(doc_row);
        let mut fold_start = fold_index.map_or(usize::MAX, |i| self.fold_lines[i].start().row);
        let mut row_length = 0;
        while row <= screen_row {
            row_length = self.row_length(doc_row);
            if row + row_length > screen_row || doc_row >= max_row {
                break;
            }
            row += row_length;
            doc_row += 1;
            if doc_row > fold_start
                && let Some(i) = fold_index
            {
                doc_row = self.fold_lines[i].end().row + 1;
                fold_index = self.next_fold_line_index(doc_row);
                fold_start = fold_index.map_or(usize::MAX, |i| self.fold_lines[i].start().row);
            }
            if cached.extend && doc_row <= max_row {
                self.row_cache.push(doc_row, row);
            }
        }

        if row + row_length <= screen_row || doc_row > max_row {
            return Position::new(max_row, self.doc.line_len(max_row));
        }
        let (text, fold_index) = match fold_index {
            Some(i) if self.fold_lines[i].start().row <= doc_row => {
                doc_row = self.fold_lines[i].start().row;
                (self.fold_display_line(&self.fold_lines[i], None, None), Some(i))
            }
            _ => (self.doc.line(doc_row).to_string(), None),
        };

        let mut doc_column = 0;
        let mut column_limit = None;
        let mut segment = text.as_str();
        if self.use_wrap_mode
            && let Some(splits) = self.wrap_data.get(doc_row)
            && let Some(&last_split) = splits.last()
        {
            let split_index = screen_row - row;
            column_limit = splits.get(split_index).copied();
            if split_index > 0 {
                doc_column = splits.get(split_index - 1).copied().unwrap_or(last_split);
                segment = slice_from(segment, doc_column);
            }
        }
        doc_column += string_screen_width(segment, Some(screen_column), 0, self.tab_size).1;
        if let Some(limit) = column_limit
            && doc_column >= limit
        {
            doc_column = limit - 1;
        }

        match fold_index {
            Some(i) => self.fold_lines[i].idx_to_position(doc_column),
            None => Position::new(doc_row, doc_column),
        }
    }

    /// Document row shown on `screen_row`.
    pub fn screen_to_document_row(&mut self, screen_row: usize, screen_column: usize) -> usize {
        self.screen_to_document_position(screen_row, screen_column).row
    }

    /// Document column shown at `(screen_row, screen_column)`.
    pub fn screen_to_document_column(&mut self, screen_row: usize, screen_column: usize) -> usize {
        self.screen_to_document_position(screen_row, screen_column).column
    }

    /// Convert a document position to a screen position.
    ///
    /// The position is clipped to the document first. Positions inside a fold map to the
    /// screen position of the fold's start; the fold's end maps past its placeholder.
    pub fn document_to_screen_position(&mut self, row: usize, column: usize) -> Position {
        let pos = self.doc.clip_position(Position::new(row, column));
        let (mut doc_row, mut doc_column) = (pos.row, pos.column);
        if let Some(fold) = self.fold_at(doc_row, doc_column, FoldEdge::ExcludeEnd) {
            doc_row = fold.range.start.row;
            doc_column = fold.range.start.column;
        }

        let cached = self.row_cache.lookup_doc(doc_row);
        let mut row = cached.entry.doc_row;
        let mut screen_row = cached.entry.screen_row;

        let mut fold_index = self.next_fold_line_index(row);
        let mut fold_start = fold_index.map_or(usize::MAX, |i| self.fold_lines[i].start().row);
        while row < doc_row {
            let row_end = match fold_index {
                Some(i) if row >= fold_start => {
                    let row_end = self.fold_lines[i].end().row + 1;
                    if row_end > doc_row {
                        break;
                    }
                    fold_index = self.next_fold_line_index(row_end);
                    fold_start = fold_index.map_or(usize::MAX, |i| self.fold_lines[i].start().row);
                    row_end
                }
                _ => row + 1,
            };
            screen_row += self.row_length(row);
            row = row_end;
            if cached.extend {
                self.row_cache.push(row, screen_row);
            }
        }

        let (text, line_start) = match fold_index {
            Some(i) if row >= fold_start => {
                let line = &self.fold_lines[i];
                let end = Position::new(doc_row, doc_column);
                (self.fold_display_line(line, Some(end), None), line.start().row)
            }
            _ => (slice_to(self.doc.line(doc_row), doc_column).to_string(), doc_row),
        };

        let mut segment = text.as_str();
        if self.use_wrap_mode
            && let Some(splits) = self.wrap_data.get(line_start)
        {
            let len = char_len(segment);
            let wrapped = splits.iter().take_while(|&&split| len >= split).count();
            screen_row += wrapped;
            if wrapped > 0 {
                segment = slice_from(segment, splits[wrapped - 1]);
            }
        }

        Position::new(
            screen_row,
            string_screen_width(segment, None, 0, self.tab_size).0,
        )
    }

    /// Screen row of a document position.
    pub fn document_to_screen_row(&mut self, row: usize, column: usize) -> usize {
        self.document_to_screen_position(row, column).row
    }

    /// Screen column of a document position.
    pub fn document_to_screen_column(&mut self, row: usize, column: usize) -> usize {
        self.document_to_screen_position(row, column).column
    }

    /// Convert both ends of a document range to screen positions.
    pub fn document_to_screen_range(&mut self, range: &Range) -> Range {
        let start = self.document_to_screen_position(range.start.row, range.start.column);
        let end = self.document_to_screen_position(range.end.row, range.end.column);
        Range::from_points(start, end)
    }

    /// Screen column at the end of `screen_row`.
    pub fn screen_last_row_column(&mut self, screen_row: usize) -> usize {
        let pos = self.screen_to_document_position(screen_row, usize::MAX);
        self.document_to_screen_column(pos.row, pos.column)
    }

    /// Screen column at the end of the screen row showing `(row, column)`.
    pub fn document_last_row_column(&mut self, row: usize, column: usize) -> usize {
        let screen_row = self.document_to_screen_row(row, column);
        self.screen_last_row_column(screen_row)
    }

    /// Document position at the end of the screen row showing `(row, column)`.
    pub fn document_last_row_column_position(&mut self, row: usize, column: usize) -> Position {
        let screen_row = self.document_to_screen_row(row, column);
        self.screen_to_document_position(screen_row, usize::MAX / 10)
    }

    /// The document-row/screen-row index.
    pub fn row_cache(&self) -> &RowCache {
        &self.row_cache
    }

    /// Forget every cached row pair.
    pub fn clear_row_cache(&mut self) {
        self.row_cache.clear();
    }
}

impl Range {
    /// This range in screen coordinates of `session`.
    pub fn to_screen_range(&self, session: &mut EditSession) -> Range {
        session.document_to_screen_range(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_widgets::LineWidget;
    use crate::options::WrapSetting;
    use pretty_assertions::assert_eq;

    fn pos(row: usize, column: usize) -> Position {
        Position::new(row, column)
    }

    #[test]
    fn test_plain_round_trip() {
        let mut session = EditSession::new("abc\n\tx\n你好");
        assert_eq!(session.document_to_screen_position(1, 1), pos(1, 4));
        assert_eq!(session.screen_to_document_position(1, 4), pos(1, 1));
        assert_eq!(session.screen_to_document_position(1, 2), pos(1, 0));
        assert_eq!(session.document_to_screen_position(2, 1), pos(2, 2));
        assert_eq!(session.screen_to_document_position(2, 3), pos(2, 1));
    }

    #[test]
    fn test_out_of_range_clips() {
        let mut session = EditSession::new("abc\nde");
        assert_eq!(session.screen_to_document_position(9, 0), pos(1, 2));
        assert_eq!(session.screen_to_document_position(0, 99), pos(0, 3));
        assert_eq!(session.document_to_screen_position(9, 9), pos(1, 2));
    }

    #[test]
    fn test_fold_collapses_rows() {
        let mut session = EditSession::new("function foo() {\n  return 1;\n}");
        session.add_fold("...", Range::new(0, 17, 2, 1)).unwrap();
        assert_eq!(session.screen_length(), 1);
        let inside = session.document_to_screen_position(1, 2);
        assert_eq!(inside, session.document_to_screen_position(0, 17));
        assert_eq!(inside, pos(0, 16));
        assert_eq!(session.screen_to_document_position(0, 17), pos(0, 16));
        assert_eq!(session.screen_to_document_position(0, 19), pos(2, 1));
    }

    #[test]
    fn test_rows_after_fold_shift_up() {
        let mut session = EditSession::new("a {\n b\n c\n}\nafter");
        session.add_fold("...", Range::new(0, 3, 3, 0)).unwrap();
        assert_eq!(session.screen_length(), 2);
        assert_eq!(session.document_to_screen_position(4, 2), pos(1, 2));
        assert_eq!(session.screen_to_document_position(1, 2), pos(4, 2));
        assert_eq!(session.document_to_screen_position(3, 1), pos(0, 7));
    }

    #[test]
    fn test_wrapped_rows() {
        let mut session = EditSession::new("hello world foo\nnext");
        session.set_wrap(WrapSetting::Columns(8));
        assert_eq!(session.screen_length(), 4);
        assert_eq!(session.document_to_screen_position(0, 7), pos(1, 1));
        assert_eq!(session.document_to_screen_position(0, 12), pos(2, 0));
        assert_eq!(session.document_to_screen_position(1, 0), pos(3, 0));
        assert_eq!(session.screen_to_document_position(1, 1), pos(0, 7));
        assert_eq!(session.screen_to_document_position(0, 50), pos(0, 5));
        assert_eq!(session.screen_to_document_position(3, 2), pos(1, 2));
        assert_eq!(session.row_line_count(0), 3);
    }

    #[test]
    fn test_line_widgets_add_rows() {
        let mut session = EditSession::new("a\nb\nc");
        session.add_line_widget(LineWidget::new(0, 2));
        assert_eq!(session.row_length(0), 3);
        assert_eq!(session.screen_length(), 5);
        assert_eq!(session.document_to_screen_position(1, 0), pos(3, 0));
        assert_eq!(session.screen_to_document_position(3, 0), pos(1, 0));
        assert_eq!(session.screen_to_document_position(1, 0), pos(0, 0));
    }

    #[test]
    fn test_cache_grows_and_resets() {
        let text: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
        let mut session = EditSession::new(&text.join("\n"));
        assert_eq!(session.document_to_screen_row(40, 0), 40);
        assert!(session.row_cache().len() >= 40);
        session.insert(pos(10, 0), "x\n");
        assert!(session.row_cache().len() <= 11);
        assert_eq!(session.document_to_screen_row(41, 0), 41);
    }

    #[test]
    fn test_last_row_column() {
        let mut session = EditSession::new("hello world foo");
        session.set_wrap(WrapSetting::Columns(8));
        assert_eq!(session.screen_last_row_column(0), 5);
        assert_eq!(session.document_last_row_column(0, 8), 5);
        assert_eq!(session.document_last_row_column_position(0, 13), pos(0, 15));
    }

    #[test]
    fn test_to_screen_range() {
        let mut session = EditSession::new("a\tb\ncd");
        let range = Range::new(0, 2, 1, 1).to_screen_range(&mut session);
        assert_eq!(range, Range::new(0, 4, 1, 1));
    }
}
