//! Soft-wrap settings and per-row split data.

use super::EditSession;
use crate::layout::{self, DisplayToken};
use crate::options::{WrapMethod, WrapSetting};
use crate::state::SessionEvent;
use crate::text::slice_chars;

/// Bounds applied to the wrap limit a host asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WrapLimitRange {
    /// Smallest allowed limit.
    pub min: Option<usize>,
    /// Largest allowed limit.
    pub max: Option<usize>,
}

impl WrapLimitRange {
    fn constrain(self, limit: usize) -> usize {
        let limit = self.min.map_or(limit, |min| limit.max(min));
        self.max.map_or(limit, |max| limit.min(max))
    }
}

impl EditSession {
    /// Whether soft wrap is on.
    pub fn use_wrap_mode(&self) -> bool {
        self.use_wrap_mode
    }

    /// Turn soft wrap on or off. Turning it on computes split data for every row.
    pub fn set_use_wrap_mode(&mut self, on: bool) {
        if self.use_wrap_mode == on {
            return;
        }
        self.use_wrap_mode = on;
        self.modified = true;
        self.row_cache.clear();
        if on {
            let rows = self.doc.len();
            self.wrap_data = vec![Vec::new(); rows];
            self.update_wrap_data(0, self.doc.last_row());
        }
        self.emit(SessionEvent::ChangeWrapMode);
    }

    /// Current wrap limit in screen columns.
    pub fn wrap_limit(&self) -> usize {
        self.wrap_limit
    }

    /// Bounds applied by [`adjust_wrap_limit`](Self::adjust_wrap_limit).
    pub fn wrap_limit_range(&self) -> WrapLimitRange {
        self.wrap_limit_range
    }

    /// Set the wrap limit bounds. The current limit is pulled into the new bounds at once.
    pub fn set_wrap_limit_range(&mut self, min: Option<usize>, max: Option<usize>) {
        let range = WrapLimitRange { min, max };
        if self.wrap_limit_range == range && !self.follow_print_margin {
            return;
        }
        self.wrap_limit_range = range;
        self.follow_print_margin = false;
        self.modified = true;
        self.apply_wrap_limit(range.constrain(self.wrap_limit));
        if self.use_wrap_mode {
            self.emit(SessionEvent::ChangeWrapMode);
        }
    }

    /// Fix the wrap limit at `limit` columns.
    pub fn set_wrap_limit(&mut self, limit: usize) {
        self.set_wrap_limit_range(Some(limit), Some(limit));
    }

    /// Ask for a wrap limit, typically the width of the view in columns.
    ///
    /// The request is constrained by the limit range, or pinned to `print_margin` when
    /// wrapping follows the print margin. Returns `true` if the limit changed.
    pub fn adjust_wrap_limit(&mut self, desired: usize, print_margin: usize) -> bool {
        let range = if self.follow_print_margin {
            WrapLimitRange {
                min: Some(print_margin),
                max: Some(print_margin),
            }
        } else {
            self.wrap_limit_range
        };
        self.apply_wrap_limit(range.constrain(desired))
    }

    fn apply_wrap_limit(&mut self, limit: usize) -> bool {
        if limit == self.wrap_limit || limit <= 1 {
            return false;
        }
        self.wrap_limit = limit;
        self.modified = true;
        if self.use_wrap_mode {
            let last = self.doc.last_row();
            self.update_wrap_data(0, last);
            self.row_cache.clear();
            self.emit(SessionEvent::ChangeWrapLimit);
        }
        true
    }

    /// Current wrap configuration.
    pub fn wrap(&self) -> WrapSetting {
        if !self.use_wrap_mode {
            WrapSetting::Off
        } else if self.follow_print_margin {
            WrapSetting::PrintMargin
        } else {
            match self.wrap_limit_range.min {
                Some(columns) => WrapSetting::Columns(columns),
                None => WrapSetting::Free,
            }
        }
    }

    /// Apply a wrap configuration.
    pub fn set_wrap(&mut self, setting: WrapSetting) {
        if setting == self.wrap() {
            return;
        }
        match setting {
            WrapSetting::Off => self.set_use_wrap_mode(false),
            WrapSetting::Free => {
                self.set_wrap_limit_range(None, None);
                self.set_use_wrap_mode(true);
            }
            WrapSetting::PrintMargin => {
                self.set_wrap_limit_range(None, None);
                self.follow_print_margin = true;
                self.set_use_wrap_mode(true);
            }
            WrapSetting::Columns(columns) => {
                self.set_wrap_limit_range(Some(columns), Some(columns));
                self.set_use_wrap_mode(true);
            }
        }
    }

    /// Break heuristics for soft wrap.
    pub fn wrap_method(&self) -> WrapMethod {
        self.wrap_method
    }

    /// Change the break heuristics, recomputing split data if the result differs.
    pub fn set_wrap_method(&mut self, method: WrapMethod) {
        let changed = method.wraps_as_code() != self.wrap_method.wraps_as_code();
        self.wrap_method = method;
        if changed && self.use_wrap_mode {
            let last = self.doc.last_row();
            self.update_wrap_data(0, last);
            self.row_cache.clear();
            self.modified = true;
        }
    }

    /// Split columns of `row`, or `None` when wrapping is off.
    ///
    /// Only rows that start a visual line carry split data; for a fold line the columns
    /// count through its display string.
    pub fn row_split_data(&self, row: usize) -> Option<&[usize]> {
        if !self.use_wrap_mode {
            return None;
        }
        self.wrap_data.get(row).map(Vec::as_slice)
    }

    /// Recompute split data for the visual lines covering rows `first..=last`.
    pub(crate) fn update_wrap_data(&mut self, first: usize, last: usize) {
        let last = last.min(self.doc.last_row());
        self.wrap_data.resize(self.doc.len(), Vec::new());
        let mut row = first;
        while row <= last {
            match self.fold_line(row) {
                None => {
                    let tokens = layout::display_tokens(self.doc.line(row), 0, self.tab_size);
                    self.wrap_data[row] =
                        layout::compute_wrap_splits(&tokens, self.wrap_limit, self.wrap_method);
                    row += 1;
                }
                Some(line) => {
                    let mut tokens: Vec<DisplayToken> = Vec::new();
                    let end_row = line.end().row;
                    let end = crate::range::Position::new(end_row, self.doc.line_len(end_row) + 1);
                    line.walk(
                        |placeholder, row, column, last_column, _| {
                            let offset = tokens.len();
                            let walked = match placeholder {
                                Some(placeholder) => {
                                    layout::placeholder_tokens(placeholder, offset, self.tab_size)
                                }
                                None => layout::display_tokens(
                                    slice_chars(self.doc.line(row), last_column, column),
                                    offset,
                                    self.tab_size,
                                ),
                            };
                            tokens.extend(walked);
                            false
                        },
                        Some(end),
                    );
                    let start_row = line.start().row;
                    self.wrap_data[start_row] =
                        layout::compute_wrap_splits(&tokens, self.wrap_limit, self.wrap_method);
                    row = end_row + 1;
                }
            }
        }
        tracing::trace!(first, last, limit = self.wrap_limit, "wrap data updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Range;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_wrap_setting_round_trip() {
        let mut session = EditSession::new("text");
        assert_eq!(session.wrap(), WrapSetting::Off);
        session.set_wrap(WrapSetting::Columns(20));
        assert_eq!(session.wrap(), WrapSetting::Columns(20));
        assert_eq!(session.wrap_limit(), 20);
        session.set_wrap(WrapSetting::Free);
        assert_eq!(session.wrap(), WrapSetting::Free);
        session.set_wrap(WrapSetting::PrintMargin);
        assert_eq!(session.wrap(), WrapSetting::PrintMargin);
        session.set_wrap(WrapSetting::Off);
        assert!(!session.use_wrap_mode());
    }

    #[test]
    fn test_split_data_follows_limit() {
        let mut session = EditSession::new("hello world foo\nshort");
        assert_eq!(session.row_split_data(0), None);
        session.set_wrap(WrapSetting::Columns(8));
        assert_eq!(session.row_split_data(0), Some(&[6, 12][..]));
        assert_eq!(session.row_split_data(1), Some(&[][..]));
    }

    #[test]
    fn test_adjust_wrap_limit_respects_range() {
        let mut session = EditSession::new("x");
        session.set_use_wrap_mode(true);
        session.set_wrap_limit_range(Some(20), Some(40));
        assert!(session.adjust_wrap_limit(30, 80));
        assert_eq!(session.wrap_limit(), 30);
        assert!(session.adjust_wrap_limit(100, 80));
        assert_eq!(session.wrap_limit(), 40);
        assert!(!session.adjust_wrap_limit(100, 80));
        assert!(session.adjust_wrap_limit(5, 80));
        assert_eq!(session.wrap_limit(), 20);
    }

    #[test]
    fn test_print_margin_pins_limit() {
        let mut session = EditSession::new("x");
        session.set_wrap(WrapSetting::PrintMargin);
        session.adjust_wrap_limit(120, 72);
        assert_eq!(session.wrap_limit(), 72);
        assert!(!session.adjust_wrap_limit(50, 72));
    }

    #[test]
    fn test_limit_change_emits_event() {
        let mut session = EditSession::new("x");
        session.set_use_wrap_mode(true);
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        session.subscribe(move |event| {
            if matches!(event, SessionEvent::ChangeWrapLimit) {
                *counter.lock().unwrap() += 1;
            }
        });
        session.adjust_wrap_limit(33, 80);
        session.adjust_wrap_limit(33, 80);
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_fold_line_wraps_as_one_row() {
        let mut session = EditSession::new("aaaa {\n  bbbb\n} cccc dddd");
        session.set_wrap(WrapSetting::Columns(10));
        session.add_fold("...", Range::new(0, 6, 2, 0)).unwrap();
        // display line: "aaaa {...} cccc dddd"
        assert_eq!(session.display_line(0, None, None), "aaaa {...} cccc dddd");
        let splits = session.row_split_data(0).unwrap().to_vec();
        assert_eq!(splits.len(), 1);
        assert!(splits[0] <= 11);
    }

    #[test]
    fn test_edits_rewrap_changed_rows() {
        let mut session = EditSession::new("short\nline");
        session.set_wrap(WrapSetting::Columns(8));
        assert_eq!(session.row_split_data(0), Some(&[][..]));
        session.insert(crate::range::Position::new(0, 5), " and longer");
        assert_eq!(session.row_split_data(0), Some(&[6, 10][..]));
        assert_eq!(session.row_split_data(1), Some(&[][..]));
    }

    #[test]
    fn test_wrap_method_switch_recomputes() {
        let mut session = EditSession::new("aaaa.bbbbbbbbbbbbb");
        session.set_wrap(WrapSetting::Columns(8));
        let text_splits = session.row_split_data(0).unwrap().to_vec();
        session.set_wrap_method(WrapMethod::Code);
        assert_eq!(session.row_split_data(0), Some(&[4, 12][..]));
        assert_ne!(text_splits, vec![4, 12]);
    }
}
