//! Line-oriented text buffer.
//!
//! [`Document`] stores the text as a vector of lines without terminators and always holds at
//! least one (possibly empty) line. Each mutation produces exactly one [`Delta`], which is
//! applied to the lines and then delivered synchronously to every subscriber in registration
//! order.
//!
//! Mutations come in two halves: a `plan_*` step that validates and clips the request and
//! builds the delta, and [`Document::apply_delta`] which performs it. The plain mutation
//! methods (`insert`, `remove`, ...) run both halves; an owning session runs them separately
//! so it can update its own derived state for the same delta.

use crate::delta::Delta;
use crate::error::{Result, SessionError};
use crate::line_ending::{self, NewLineMode};
use crate::range::{Position, Range};
use crate::text::{byte_index, char_len, slice_chars, slice_from, slice_to, split_lines};
use std::fmt;

/// Delta observer callback.
pub type DeltaCallback = Box<dyn FnMut(&Delta) + Send>;

/// Handle returned by [`Document::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The text buffer.
pub struct Document {
    lines: Vec<String>,
    new_line_mode: NewLineMode,
    auto_new_line: Option<&'static str>,
    listeners: Vec<(ListenerId, DeltaCallback)>,
    next_listener: u64,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.lines)
            .field("new_line_mode", &self.new_line_mode)
            .field("auto_new_line", &self.auto_new_line)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl Document {
    /// Create a document from text. Line breaks may be `\n`, `\r\n` or `\r`.
    pub fn new(text: &str) -> Self {
        let mut doc = Self {
            lines: vec![String::new()],
            new_line_mode: NewLineMode::Auto,
            auto_new_line: None,
            listeners: Vec::new(),
            next_listener: 0,
        };
        if !text.is_empty() {
            doc.insert(Position::new(0, 0), text);
        }
        doc
    }

    /// Create a document from pre-split lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            lines,
            new_line_mode: NewLineMode::Auto,
            auto_new_line: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Register a delta observer.
    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&Delta) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Remove a delta observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// The whole text, rows joined by [`new_line_character`](Self::new_line_character).
    pub fn value(&self) -> String {
        self.lines.join(self.new_line_character())
    }

    /// Replace the whole text.
    pub fn set_value(&mut self, text: &str) {
        let (_, remove) = self.plan_remove(self.full_range());
        if let Some(delta) = remove {
            self.apply_delta(&delta);
        }
        self.insert(Position::new(0, 0), text);
    }

    /// Range covering the entire document.
    pub fn full_range(&self) -> Range {
        let last = self.lines.len() - 1;
        Range::new(0, 0, last, char_len(&self.lines[last]))
    }

    /// The newline sequence for the current mode.
    pub fn new_line_character(&self) -> &'static str {
        match self.new_line_mode {
            NewLineMode::Windows => "\r\n",
            NewLineMode::Unix => "\n",
            NewLineMode::Auto => self.auto_new_line.unwrap_or("\n"),
        }
    }

    /// Set the newline mode. Returns `true` if it changed.
    pub fn set_new_line_mode(&mut self, mode: NewLineMode) -> bool {
        let changed = self.new_line_mode != mode;
        self.new_line_mode = mode;
        changed
    }

    /// Current newline mode.
    pub fn new_line_mode(&self) -> NewLineMode {
        self.new_line_mode
    }

    /// Returns `true` if `text` is a single line break.
    pub fn is_new_line(&self, text: &str) -> bool {
        line_ending::is_new_line(text)
    }

    /// Row `row`, or `""` if out of range.
    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map_or("", String::as_str)
    }

    /// Rows `first..=last`, clamped to the document.
    pub fn lines(&self, first: usize, last: usize) -> &[String] {
        let end = (last + 1).min(self.lines.len());
        let start = first.min(end);
        &self.lines[start..end]
    }

    /// All rows.
    pub fn all_lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of rows. A document always holds at least one row, even when empty.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Index of the last row.
    pub fn last_row(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    /// Returns `true` if the document is a single empty row.
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Length of row `row` in characters (0 if out of range).
    pub fn line_len(&self, row: usize) -> usize {
        char_len(self.line(row))
    }

    /// The text covered by `range`, rows joined by the document newline.
    pub fn text_range(&self, range: &Range) -> String {
        if range.start.row == range.end.row {
            return slice_chars(self.line(range.start.row), range.start.column, range.end.column)
                .to_string();
        }
        let lines = self.lines(range.start.row, range.end.row);
        let mut parts: Vec<&str> = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let row = range.start.row + i;
            let part = if i == 0 {
                slice_from(line, range.start.column)
            } else if row == range.end.row {
                slice_to(line, range.end.column)
            } else {
                line.as_str()
            };
            parts.push(part);
        }
        parts.join(self.new_line_character())
    }

    /// Clamp a position into the document.
    ///
    /// Rows past the end clamp to the end of the last row; columns clamp to the row length.
    pub fn clip_position(&self, pos: Position) -> Position {
        let len = self.lines.len();
        if pos.row >= len {
            let row = len - 1;
            return Position::new(row, self.line_len(row));
        }
        Position::new(pos.row, pos.column.min(self.line_len(pos.row)))
    }

    /// Insert `text` at `pos`, returning the position after the inserted text.
    pub fn insert(&mut self, pos: Position, text: &str) -> Position {
        let (end, delta) = self.plan_insert(pos, text);
        if let Some(delta) = delta {
            self.apply_delta(&delta);
        }
        end
    }

    /// Insert text that contains no line break into a single row.
    pub fn insert_in_line(&mut self, pos: Position, text: &str) -> Position {
        self.insert(pos, text)
    }

    /// Split the row at `pos`.
    pub fn insert_new_line(&mut self, pos: Position) -> Position {
        let nl = self.new_line_character();
        self.insert(pos, nl)
    }

    /// Insert whole lines before `row`. Inserting at or past the end appends them.
    pub fn insert_lines(&mut self, row: usize, lines: &[String]) -> Position {
        let (end, delta) = self.plan_insert_lines(row, lines);
        if let Some(delta) = delta {
            self.apply_delta(&delta);
        }
        end
    }

    /// Remove the text in `range`, returning the (clipped) range start.
    pub fn remove(&mut self, range: Range) -> Position {
        let (start, delta) = self.plan_remove(range);
        if let Some(delta) = delta {
            self.apply_delta(&delta);
        }
        start
    }

    /// Remove `start_column..end_column` from a single row.
    pub fn remove_in_line(&mut self, row: usize, start_column: usize, end_column: usize) -> Position {
        self.remove(Range::new(row, start_column, row, end_column))
    }

    /// Join row `row` with the following row.
    pub fn remove_new_line(&mut self, row: usize) {
        let range = Range::new(row, self.line_len(row), row + 1, 0);
        self.remove(range);
    }

    /// Remove rows `first..=last`, returning the removed lines.
    pub fn remove_lines(&mut self, first: usize, last: usize) -> Result<Vec<String>> {
        let (removed, delta) = self.plan_remove_lines(first, last)?;
        if let Some(delta) = delta {
            self.apply_delta(&delta);
        }
        Ok(removed)
    }

    /// Replace the text in `range` with `text`.
    ///
    /// Returns `range.start` for an empty range with empty text, and `range.end` without
    /// emitting anything when `text` equals the current content of `range`.
    pub fn replace(&mut self, range: Range, text: &str) -> Position {
        match self.plan_replace(range, text) {
            ReplacePlan::Unchanged(pos) => pos,
            ReplacePlan::Edit { range, text } => {
                let start = self.remove(range);
                if text.is_empty() {
                    start
                } else {
                    self.insert(start, &text)
                }
            }
        }
    }

    /// Apply deltas in order.
    pub fn apply_deltas(&mut self, deltas: &[Delta]) {
        for delta in deltas {
            self.apply_delta(delta);
        }
    }

    /// Undo deltas by applying their inverses in reverse order.
    pub fn revert_deltas(&mut self, deltas: &[Delta]) {
        for delta in deltas.iter().rev() {
            self.apply_delta(&delta.inverse());
        }
    }

    /// Convert a character index (counting newline characters) into a position.
    ///
    /// Counting starts at `start_row`. Indexes past the end clamp to the document end.
    pub fn index_to_position(&self, index: usize, start_row: usize) -> Position {
        let nl_len = self.new_line_character().len();
        let mut remaining = index;
        for (row, line) in self.lines.iter().enumerate().skip(start_row) {
            let len = char_len(line);
            if remaining < len + nl_len {
                return Position::new(row, remaining.min(len));
            }
            remaining -= len + nl_len;
        }
        let last = self.lines.len() - 1;
        Position::new(last, self.line_len(last))
    }

    /// Convert a position into a character index counted from `start_row`.
    pub fn position_to_index(&self, pos: Position, start_row: usize) -> usize {
        let nl_len = self.new_line_character().len();
        let row = pos.row.min(self.lines.len());
        let mut index = 0;
        for line in self.lines.iter().take(row).skip(start_row) {
            index += char_len(line) + nl_len;
        }
        index + pos.column
    }

    /// Validate an insertion and build its delta.
    pub(crate) fn plan_insert(&mut self, pos: Position, text: &str) -> (Position, Option<Delta>) {
        if text.is_empty() {
            return (pos, None);
        }
        let start = self.clip_position(pos);
        if self.lines.len() <= 1 {
            self.auto_new_line = Some(line_ending::detect_new_line(text));
        }
        let fragments = split_lines(text);
        let last = fragments.len() - 1;
        let end = if last == 0 {
            Position::new(start.row, start.column + char_len(&fragments[0]))
        } else {
            Position::new(start.row + last, char_len(&fragments[last]))
        };
        let delta = Delta::InsertText {
            range: Range::from_points(start, end),
            text: text.to_string(),
        };
        (end, Some(delta))
    }

    /// Validate a line insertion and build its delta.
    pub(crate) fn plan_insert_lines(
        &mut self,
        row: usize,
        lines: &[String],
    ) -> (Position, Option<Delta>) {
        if row >= self.lines.len() {
            let mut text = String::from("\n");
            text.push_str(&lines.join("\n"));
            return self.plan_insert(Position::new(row, 0), &text);
        }
        if lines.is_empty() {
            return (Position::new(row, 0), None);
        }
        let range = Range::new(row, 0, row + lines.len(), 0);
        (
            range.end,
            Some(Delta::InsertLines {
                range,
                lines: lines.to_vec(),
            }),
        )
    }

    /// Validate a removal and build its delta.
    pub(crate) fn plan_remove(&self, range: Range) -> (Position, Option<Delta>) {
        let mut start = self.clip_position(range.start);
        let mut end = self.clip_position(range.end);
        if end < start {
            std::mem::swap(&mut start, &mut end);
        }
        let range = Range::from_points(start, end);
        if range.is_empty() {
            return (start, None);
        }
        let text = self.text_range(&range);
        (start, Some(Delta::RemoveText { range, text }))
    }

    /// Validate a line removal and build its delta, returned with the removed lines.
    ///
    /// Removing every row leaves one empty row behind, so that case is recorded as a text
    /// removal whose inverse restores the document exactly. `None` means the document was
    /// already a single empty row.
    pub(crate) fn plan_remove_lines(
        &self,
        first: usize,
        last: usize,
    ) -> Result<(Vec<String>, Option<Delta>)> {
        if first > last || last >= self.lines.len() {
            return Err(SessionError::RowOutOfBounds {
                first,
                last,
                len: self.lines.len(),
            });
        }
        let lines = self.lines[first..=last].to_vec();
        if first == 0 && last == self.last_row() {
            let range = Range::new(0, 0, last, self.line_len(last));
            let delta = (!range.is_empty()).then(|| Delta::RemoveText {
                range,
                text: lines.join("\n"),
            });
            return Ok((lines, delta));
        }
        let delta = Delta::RemoveLines {
            range: Range::new(first, 0, last + 1, 0),
            lines: lines.clone(),
        };
        Ok((lines, Some(delta)))
    }

    /// Decide what a replace has to do.
    pub(crate) fn plan_replace(&self, range: Range, text: &str) -> ReplacePlan {
        if text.is_empty() && range.is_empty() {
            return ReplacePlan::Unchanged(range.start);
        }
        if text == self.text_range(&range) {
            return ReplacePlan::Unchanged(range.end);
        }
        ReplacePlan::Edit {
            range,
            text: text.to_string(),
        }
    }

    /// Apply one delta to the lines and notify subscribers.
    ///
    /// Rows referenced by the delta are clamped to the document, so replaying a delta
    /// recorded against different content cannot panic.
    pub fn apply_delta(&mut self, delta: &Delta) {
        match delta {
            Delta::InsertText { range, text } => {
                let start = self.clip_position(range.start);
                let line = &self.lines[start.row];
                let split = byte_index(line, start.column);
                let head = line[..split].to_string();
                let tail = line[split..].to_string();
                let mut fragments = split_lines(text);
                let last = fragments.len() - 1;
                fragments[0].insert_str(0, &head);
                fragments[last].push_str(&tail);
                self.lines.splice(start.row..=start.row, fragments);
            }
            Delta::RemoveText { range, .. } => {
                let start = self.clip_position(range.start);
                let end = self.clip_position(range.end).max(start);
                let head = slice_to(&self.lines[start.row], start.column).to_string();
                let tail = slice_from(&self.lines[end.row], end.column);
                let joined = head + tail;
                self.lines.splice(start.row..=end.row, [joined]);
            }
            Delta::InsertLines { range, lines } => {
                let row = range.start.row.min(self.lines.len());
                self.lines.splice(row..row, lines.iter().cloned());
            }
            Delta::RemoveLines { range, .. } => {
                let end = range.end.row.min(self.lines.len());
                let start = range.start.row.min(end);
                self.lines.drain(start..end);
                if self.lines.is_empty() {
                    self.lines.push(String::new());
                }
            }
        }
        for (_, callback) in self.listeners.iter_mut() {
            callback(delta);
        }
    }
}

/// Outcome of [`Document::plan_replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplacePlan {
    /// Nothing to do; the replace returns this position.
    Unchanged(Position),
    /// Remove `range`, then insert `text` at its start.
    Edit {
        /// Range to remove.
        range: Range,
        /// Text to insert.
        text: String,
    },
}
