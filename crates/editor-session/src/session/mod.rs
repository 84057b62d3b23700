//! The edit session: one document plus everything derived from it.
//!
//! [`EditSession`] owns a [`Document`] and routes every edit through a single path: the
//! document builds a [`Delta`], the session applies it, then updates folds, soft-wrap data,
//! the row cache, fold widgets and row-attached decorations for that delta before notifying
//! subscribers. Keeping the document private to the session is what guarantees that no
//! derived state ever sees a delta twice or misses one.
//!
//! The implementation is split by concern:
//!
//! - `folding`: fold storage, fold queries and fold widgets
//! - `wrapping`: soft-wrap settings and per-row split data
//! - `mapping`: document/screen coordinate conversion
//! - `editing`: compound edits (moving text and lines, indentation, word ranges)

mod editing;
mod folding;
mod mapping;
mod wrapping;

pub use folding::{FoldEdge, FoldWidgetToggle, ParentFoldRange};
pub use wrapping::WrapLimitRange;

use crate::decorations::{
    Annotation, DEFAULT_BREAKPOINT_CLASS, DEFAULT_HIGHLIGHT_CLASS, Decorations, Marker, MarkerId,
    MarkerKind,
};
use crate::delta::Delta;
use crate::document::{Document, ReplacePlan};
use crate::error::{Result, SessionError};
use crate::fold::Fold;
use crate::fold_line::FoldLine;
use crate::fold_mode::{FoldProvider, FoldStyle, FoldWidget};
use crate::layout;
use crate::line_ending::NewLineMode;
use crate::line_widgets::{LineWidget, LineWidgets};
use crate::options::{DEFAULT_TAB_SIZE, DEFAULT_WRAP_LIMIT, SessionOptions, WrapMethod};
use crate::range::{Position, Range};
use crate::row_cache::RowCache;
use crate::state::{SessionEvent, SubscriptionId, Subscribers};
use crate::undo::{DeltaGroup, UndoManager};
use editor_session_lang::BracketConfig;
use std::cmp::Ordering;
use std::fmt;

/// A document with folds, soft wrap, decorations and undo history.
pub struct EditSession {
    doc: Document,

    tab_size: usize,
    use_soft_tabs: bool,
    overwrite: bool,
    indented_soft_wrap: bool,
    scroll_top: f64,
    scroll_left: f64,

    fold_lines: Vec<FoldLine>,
    fold_style: FoldStyle,
    fold_provider: Option<Box<dyn FoldProvider>>,
    /// Per-row widget cache; the outer `Option` marks rows not yet asked. `None` when
    /// folding is off (manual style or no provider).
    fold_widgets: Option<Vec<Option<Option<FoldWidget>>>>,
    /// Set while a delta is being absorbed, so fold removal skips its own layout update.
    updating: bool,

    use_wrap_mode: bool,
    wrap_limit: usize,
    wrap_limit_range: WrapLimitRange,
    /// The limit range follows the print margin passed to `adjust_wrap_limit`.
    follow_print_margin: bool,
    wrap_method: WrapMethod,
    /// Split columns per row; only rows that start a visual line are kept current.
    wrap_data: Vec<Vec<usize>>,
    /// Lazily measured screen width of each row.
    row_length_cache: Vec<Option<usize>>,
    row_cache: RowCache,
    /// The widest row needs to be measured again.
    modified: bool,
    cached_width: usize,

    brackets: BracketConfig,
    decorations: Decorations,
    line_widgets: LineWidgets,

    undo_manager: UndoManager,
    pending_doc: Vec<Delta>,
    pending_fold: Vec<Fold>,
    merge_undo_deltas: bool,
    from_undo: bool,

    subscribers: Subscribers,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("rows", &self.doc.len())
            .field("tab_size", &self.tab_size)
            .field("fold_lines", &self.fold_lines.len())
            .field("fold_style", &self.fold_style)
            .field("use_wrap_mode", &self.use_wrap_mode)
            .field("wrap_limit", &self.wrap_limit)
            .field("row_cache", &self.row_cache.len())
            .field("undo_depth", &self.undo_manager.undo_depth())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new("")
    }
}

impl EditSession {
    /// Create a session over `text` with default options.
    pub fn new(text: &str) -> Self {
        Self::from_document(Document::new(text))
    }

    /// Create a session that takes ownership of `doc`.
    pub fn from_document(doc: Document) -> Self {
        let rows = doc.len();
        Self {
            doc,
            tab_size: DEFAULT_TAB_SIZE,
            use_soft_tabs: true,
            overwrite: false,
            indented_soft_wrap: true,
            scroll_top: 0.0,
            scroll_left: 0.0,
            fold_lines: Vec::new(),
            fold_style: FoldStyle::MarkBegin,
            fold_provider: None,
            fold_widgets: None,
            updating: false,
            use_wrap_mode: false,
            wrap_limit: DEFAULT_WRAP_LIMIT,
            wrap_limit_range: WrapLimitRange::default(),
            follow_print_margin: false,
            wrap_method: WrapMethod::Auto,
            wrap_data: vec![Vec::new(); rows],
            row_length_cache: vec![None; rows],
            row_cache: RowCache::new(),
            modified: true,
            cached_width: 0,
            brackets: BracketConfig::default(),
            decorations: Decorations::new(),
            line_widgets: LineWidgets::new(),
            undo_manager: UndoManager::new(),
            pending_doc: Vec::new(),
            pending_fold: Vec::new(),
            merge_undo_deltas: false,
            from_undo: false,
            subscribers: Subscribers::default(),
        }
    }

    /// Create a session over `text` and apply `options`.
    pub fn with_options(text: &str, options: &SessionOptions) -> Result<Self> {
        let mut session = Self::new(text);
        session.set_options(options)?;
        Ok(session)
    }

    /// Apply every setting in `options`.
    ///
    /// The tab size is validated first, so an invalid value leaves the session untouched.
    pub fn set_options(&mut self, options: &SessionOptions) -> Result<()> {
        if options.tab_size == 0 {
            return Err(SessionError::InvalidTabSize);
        }
        self.set_tab_size(options.tab_size)?;
        self.set_use_soft_tabs(options.use_soft_tabs);
        self.set_wrap_method(options.wrap_method);
        self.set_wrap(options.wrap);
        self.set_fold_style(options.fold_style);
        self.set_new_line_mode(options.new_line_mode);
        self.indented_soft_wrap = options.indented_soft_wrap;
        self.set_overwrite(options.overwrite);
        Ok(())
    }

    /// Current settings.
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            tab_size: self.tab_size,
            use_soft_tabs: self.use_soft_tabs,
            wrap: self.wrap(),
            wrap_method: self.wrap_method,
            fold_style: self.fold_style,
            new_line_mode: self.doc.new_line_mode(),
            indented_soft_wrap: self.indented_soft_wrap,
            overwrite: self.overwrite,
        }
    }

    /// The underlying document. Edits go through the session.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a callback for session events.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.subscribers.add(Box::new(callback))
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.emit(&event);
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// The whole text, joined with the current newline sequence.
    pub fn value(&self) -> String {
        self.doc.value()
    }

    /// Replace the whole text.
    ///
    /// Folds, caches and undo history are reset; the replacement itself is not undoable.
    pub fn set_value(&mut self, text: &str) {
        let full = self.doc.full_range();
        self.remove(full);
        self.insert(Position::new(0, 0), text);

        self.fold_lines.clear();
        let rows = self.doc.len();
        self.wrap_data = vec![Vec::new(); rows];
        self.row_length_cache = vec![None; rows];
        if self.use_wrap_mode {
            self.update_wrap_data(0, self.doc.last_row());
        }
        if let Some(cache) = &mut self.fold_widgets {
            cache.clear();
        }
        self.row_cache.clear();
        self.modified = true;
        self.pending_doc.clear();
        self.pending_fold.clear();
        self.merge_undo_deltas = false;
        self.undo_manager.reset();
    }

    /// Text of `row`, or `""` past the end.
    pub fn line(&self, row: usize) -> &str {
        self.doc.line(row)
    }

    /// Rows `first..=last`, clamped to the document.
    pub fn lines(&self, first: usize, last: usize) -> &[String] {
        self.doc.lines(first, last)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.doc.len()
    }

    /// Returns `true` if the document is a single empty row.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Text covered by `range`.
    pub fn text_range(&self, range: &Range) -> String {
        self.doc.text_range(range)
    }

    /// Insert `text` at `pos`; returns the end of the inserted text.
    pub fn insert(&mut self, pos: Position, text: &str) -> Position {
        let (end, delta) = self.doc.plan_insert(pos, text);
        if let Some(delta) = delta {
            self.apply_change(&delta);
        }
        end
    }

    /// Insert whole lines before `row`; returns the position after them.
    pub fn insert_lines(&mut self, row: usize, lines: &[String]) -> Position {
        let (end, delta) = self.doc.plan_insert_lines(row, lines);
        if let Some(delta) = delta {
            self.apply_change(&delta);
        }
        end
    }

    /// Remove `range`; returns its (clipped) start.
    pub fn remove(&mut self, range: Range) -> Position {
        let (start, delta) = self.doc.plan_remove(range);
        if let Some(delta) = delta {
            self.apply_change(&delta);
        }
        start
    }

    /// Remove rows `first..=last`, returning their text.
    pub fn remove_lines(&mut self, first: usize, last: usize) -> Result<Vec<String>> {
        let (lines, delta) = self.doc.plan_remove_lines(first, last)?;
        if let Some(delta) = delta {
            self.apply_change(&delta);
        }
        Ok(lines)
    }

    /// Replace `range` with `text`; returns the end of the new text.
    ///
    /// Replacing a range with its current content changes nothing and emits nothing.
    pub fn replace(&mut self, range: Range, text: &str) -> Position {
        match self.doc.plan_replace(range, text) {
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

    /// Set the newline mode used by [`value`](Self::value).
    pub fn set_new_line_mode(&mut self, mode: NewLineMode) {
        if self.doc.set_new_line_mode(mode) {
            self.emit(SessionEvent::ChangeNewLineMode);
        }
    }

    /// Current newline mode.
    pub fn new_line_mode(&self) -> NewLineMode {
        self.doc.new_line_mode()
    }

    fn apply_change(&mut self, delta: &Delta) {
        self.doc.apply_delta(delta);
        self.on_change(delta);
    }

    /// Bring all derived state in line with a delta that was just applied to the document.
    fn on_change(&mut self, delta: &Delta) {
        self.modified = true;
        // A removal can take the start row itself; the last surviving row is then the
        // newest entry that is still valid.
        self.row_cache
            .reset(delta.range().start.row.min(self.doc.last_row()));

        let removed_folds = self.update_internal_data_on_change(delta);
        if !self.from_undo {
            self.pending_doc.push(delta.clone());
            if !removed_folds.is_empty() {
                self.pending_fold.extend(removed_folds);
            }
        }

        self.update_fold_widgets(delta);
        let (gutter_changed, annotations_changed) = self.decorations.update_on_change(delta);
        let dropped = self.line_widgets.update_on_change(delta);
        if !dropped.is_empty() {
            tracing::trace!(count = dropped.len(), "line widgets dropped with their rows");
        }

        self.emit(SessionEvent::Change {
            delta: delta.clone(),
        });
        if gutter_changed {
            self.emit(SessionEvent::ChangeBreakpoint);
        }
        if annotations_changed {
            self.emit(SessionEvent::ChangeAnnotation);
        }
    }

    /// Move folds and resize caches for `delta`. Returns the folds the edit destroyed.
    fn update_internal_data_on_change(&mut self, delta: &Delta) -> Vec<Fold> {
        let range = delta.range();
        let (start, end) = (range.start, range.end);
        let first_row = start.row;
        let mut last_row = end.row;
        let len = end.row - start.row;
        let removed;

        self.updating = true;
        if len != 0 {
            if delta.is_remove() {
                let cut = first_row.min(self.wrap_data.len())
                    ..(first_row + len).min(self.wrap_data.len());
                self.wrap_data.drain(cut);
                let cut = first_row.min(self.row_length_cache.len())
                    ..(first_row + len).min(self.row_length_cache.len());
                self.row_length_cache.drain(cut);

                removed = self.folds_in_range(&range);
                self.remove_folds(&removed);

                let mut idx = 0;
                if let Some(i) = self.fold_line_index(end.row) {
                    let line = &mut self.fold_lines[i];
                    line.add_remove_chars(
                        end.row,
                        end.column,
                        start.column as isize - end.column as isize,
                    );
                    line.shift_row(-(len as isize));
                    idx = i + 1;

                    if let Some(before) = self.fold_line_index(first_row).filter(|&b| b != i) {
                        let line = self.fold_lines.remove(i);
                        if let Err(err) = self.fold_lines[before].merge(line) {
                            tracing::debug!(%err, "fold lines not merged after removal");
                        }
                        idx = before + 1;
                    }
                }
                for line in self.fold_lines.iter_mut().skip(idx) {
                    if line.start().row >= end.row {
                        line.shift_row(-(len as isize));
                    }
                }
                last_row = first_row;
            } else {
                let at = first_row.min(self.wrap_data.len());
                self.wrap_data
                    .splice(at..at, std::iter::repeat_n(Vec::new(), len));
                let at = first_row.min(self.row_length_cache.len());
                self.row_length_cache
                    .splice(at..at, std::iter::repeat_n(None, len));

                removed = self.unfold_around(start);

                let mut idx = 0;
                if let Some(i) = self.fold_line_index(first_row) {
                    idx = i + 1;
                    match self.fold_lines[i].range().compare_inside(start.row, start.column) {
                        Ordering::Equal => {
                            if let Some(mut tail) = self.fold_lines[i].split(start.row, start.column) {
                                tail.shift_row(len as isize);
                                tail.add_remove_chars(
                                    last_row,
                                    0,
                                    end.column as isize - start.column as isize,
                                );
                                self.fold_lines.insert(i + 1, tail);
                                idx = i + 2;
                            }
                        }
                        Ordering::Less => {
                            let line = &mut self.fold_lines[i];
                            line.add_remove_chars(
                                first_row,
                                0,
                                end.column as isize - start.column as isize,
                            );
                            line.shift_row(len as isize);
                        }
                        Ordering::Greater => {}
                    }
                }
                for line in self.fold_lines.iter_mut().skip(idx) {
                    if line.start().row >= first_row {
                        line.shift_row(len as isize);
                    }
                }
            }
        } else {
            let mut chars = start.column.abs_diff(end.column) as isize;
            if delta.is_remove() {
                removed = self.folds_in_range(&range);
                self.remove_folds(&removed);
                chars = -chars;
            } else {
                removed = self.unfold_around(start);
            }
            if let Some(i) = self.fold_line_index(first_row) {
                self.fold_lines[i].add_remove_chars(first_row, start.column, chars);
            }
        }
        self.updating = false;

        let rows = self.doc.len();
        self.wrap_data.resize(rows, Vec::new());
        self.row_length_cache.resize(rows, None);

        // Fold lines that lost a fold may now start or end elsewhere in the edited region.
        let mut layout_first = first_row;
        let mut layout_last = last_row;
        for fold in &removed {
            layout_first = layout_first.min(fold.range.start.row);
            let end_row = delta.map_row(fold.range.end.row).unwrap_or(first_row);
            layout_last = layout_last.max(end_row);
        }
        self.update_layout_rows(layout_first, layout_last.min(self.doc.last_row()));
        removed
    }

    /// Remove the folds that strictly contain `pos`, where text is about to appear.
    fn unfold_around(&mut self, pos: Position) -> Vec<Fold> {
        let Some(i) = self.fold_line_index(pos.row) else {
            return Vec::new();
        };
        let inside: Vec<Fold> = self.fold_lines[i]
            .folds()
            .iter()
            .filter(|f| f.range.inside(pos.row, pos.column))
            .cloned()
            .collect();
        self.remove_folds(&inside);
        inside
    }

    /// Refresh wrap data and measured widths for rows `first..=last`.
    fn update_layout_rows(&mut self, first: usize, last: usize) {
        if self.use_wrap_mode {
            self.update_wrap_data(first, last);
        }
        let end = (last + 1).min(self.row_length_cache.len());
        if first < end {
            self.row_length_cache[first..end].fill(None);
        }
    }

    // ------------------------------------------------------------------
    // Undo
    // ------------------------------------------------------------------

    /// The undo history.
    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo_manager
    }

    /// The undo history, for marking clean points or resetting.
    pub fn undo_manager_mut(&mut self) -> &mut UndoManager {
        &mut self.undo_manager
    }

    /// Fold the next recorded step into the previous one.
    pub fn set_merge_undo_deltas(&mut self, merge: bool) {
        self.merge_undo_deltas = merge;
    }

    /// Close the current undo step.
    ///
    /// Edits accumulate until this is called; folds destroyed by those edits are recorded
    /// ahead of them so undo restores the text first and the folds second.
    pub fn mark_undo_group(&mut self) {
        let mut groups = Vec::new();
        if !self.pending_fold.is_empty() {
            groups.push(DeltaGroup::Fold(std::mem::take(&mut self.pending_fold)));
        }
        if !self.pending_doc.is_empty() {
            groups.push(DeltaGroup::Doc(std::mem::take(&mut self.pending_doc)));
        }
        if !groups.is_empty() {
            self.undo_manager.execute(groups, self.merge_undo_deltas);
        }
        self.merge_undo_deltas = false;
    }

    /// Returns `true` if [`undo`](Self::undo) would change something.
    pub fn has_undo(&self) -> bool {
        !self.pending_doc.is_empty() || self.undo_manager.has_undo()
    }

    /// Returns `true` if [`redo`](Self::redo) would change something.
    pub fn has_redo(&self) -> bool {
        self.pending_doc.is_empty() && self.undo_manager.has_redo()
    }

    /// Undo the last step and return the range a host should select.
    pub fn undo(&mut self) -> Option<Range> {
        self.mark_undo_group();
        let groups = self.undo_manager.undo()?;
        self.undo_changes(&groups)
    }

    /// Redo the last undone step and return the range a host should select.
    pub fn redo(&mut self) -> Option<Range> {
        self.mark_undo_group();
        let groups = self.undo_manager.redo()?;
        self.redo_changes(&groups)
    }

    /// Revert recorded groups, newest first. Destroyed folds are restored after the text.
    ///
    /// Reverted edits are not recorded again.
    pub fn undo_changes(&mut self, groups: &[DeltaGroup]) -> Option<Range> {
        self.from_undo = true;
        let mut last = None;
        for group in groups.iter().rev() {
            match group {
                DeltaGroup::Doc(deltas) => {
                    for delta in deltas.iter().rev() {
                        self.apply_change(&delta.inverse());
                    }
                    last = undo_selection(deltas, true, last);
                }
                DeltaGroup::Fold(folds) => self.add_folds(folds.clone()),
            }
        }
        self.from_undo = false;
        last
    }

    /// Re-apply recorded groups in order.
    pub fn redo_changes(&mut self, groups: &[DeltaGroup]) -> Option<Range> {
        self.from_undo = true;
        let mut last = None;
        for group in groups {
            if let DeltaGroup::Doc(deltas) = group {
                for delta in deltas {
                    self.apply_change(delta);
                }
                last = undo_selection(deltas, false, last);
            }
        }
        self.from_undo = false;
        last
    }

    // ------------------------------------------------------------------
    // Tabs and flags
    // ------------------------------------------------------------------

    /// Columns per tab stop.
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Set the tab width. Measured widths and wrap data are recomputed.
    pub fn set_tab_size(&mut self, tab_size: usize) -> Result<()> {
        if tab_size == 0 {
            return Err(SessionError::InvalidTabSize);
        }
        if tab_size == self.tab_size {
            return Ok(());
        }
        self.tab_size = tab_size;
        self.modified = true;
        self.row_length_cache.fill(None);
        self.row_cache.clear();
        if self.use_wrap_mode {
            let last = self.doc.last_row();
            self.update_wrap_data(0, last);
        }
        self.emit(SessionEvent::ChangeTabSize);
        Ok(())
    }

    /// Whether indentation uses spaces.
    pub fn use_soft_tabs(&self) -> bool {
        self.use_soft_tabs
    }

    /// Indent with spaces (`true`) or tab characters.
    pub fn set_use_soft_tabs(&mut self, soft: bool) {
        self.use_soft_tabs = soft;
    }

    /// One level of indentation.
    pub fn tab_string(&self) -> String {
        if self.use_soft_tabs {
            " ".repeat(self.tab_size)
        } else {
            "\t".to_string()
        }
    }

    /// Returns `true` if soft tabs are on and `pos` sits on a tab stop.
    pub fn is_tab_stop(&self, pos: Position) -> bool {
        self.use_soft_tabs && pos.column % self.tab_size == 0
    }

    /// Width of a tab starting at `screen_column`.
    pub fn screen_tab_size(&self, screen_column: usize) -> usize {
        layout::screen_tab_size(self.tab_size, screen_column)
    }

    /// Whether typing replaces the next character.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Set the overwrite flag.
    pub fn set_overwrite(&mut self, overwrite: bool) {
        if self.overwrite != overwrite {
            self.overwrite = overwrite;
            self.emit(SessionEvent::ChangeOverwrite);
        }
    }

    /// Flip the overwrite flag.
    pub fn toggle_overwrite(&mut self) {
        self.set_overwrite(!self.overwrite);
    }

    /// Whether hosts should indent wrapped continuation rows.
    pub fn indented_soft_wrap(&self) -> bool {
        self.indented_soft_wrap
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    /// Vertical scroll offset.
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Set the vertical scroll offset.
    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        if self.scroll_top == scroll_top || scroll_top.is_nan() {
            return;
        }
        self.scroll_top = scroll_top;
        self.emit(SessionEvent::ChangeScrollTop { scroll_top });
    }

    /// Horizontal scroll offset.
    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    /// Set the horizontal scroll offset.
    pub fn set_scroll_left(&mut self, scroll_left: f64) {
        if self.scroll_left == scroll_left || scroll_left.is_nan() {
            return;
        }
        self.scroll_left = scroll_left;
        self.emit(SessionEvent::ChangeScrollLeft { scroll_left });
    }

    // ------------------------------------------------------------------
    // Decorations
    // ------------------------------------------------------------------

    /// Markers, gutter decorations, breakpoints and annotations.
    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    /// Highlight `range` and return the marker id.
    pub fn add_marker(
        &mut self,
        range: Range,
        class: &str,
        kind: MarkerKind,
        in_front: bool,
    ) -> MarkerId {
        let id = self.decorations.add_marker(range, class, kind, in_front);
        self.emit_marker_change(in_front);
        id
    }

    /// Remove a marker.
    pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
        let marker = self.decorations.remove_marker(id)?;
        self.emit_marker_change(marker.in_front);
        Some(marker)
    }

    /// Markers in front of or behind the text.
    pub fn markers(&self, in_front: bool) -> impl Iterator<Item = &Marker> {
        self.decorations.markers(in_front)
    }

    /// Highlight whole rows `start_row..=end_row` with `class` (default `ace_step`).
    pub fn highlight_lines(
        &mut self,
        start_row: usize,
        end_row: usize,
        class: Option<&str>,
        in_front: bool,
    ) -> MarkerId {
        let range = Range::new(start_row, 0, end_row, usize::MAX);
        let class = class.unwrap_or(DEFAULT_HIGHLIGHT_CLASS);
        self.add_marker(range, class, MarkerKind::FullLine, in_front)
    }

    fn emit_marker_change(&mut self, in_front: bool) {
        self.emit(if in_front {
            SessionEvent::ChangeFrontMarker
        } else {
            SessionEvent::ChangeBackMarker
        });
    }

    /// Add a gutter class to `row`.
    pub fn add_gutter_decoration(&mut self, row: usize, class: &str) {
        self.decorations.add_gutter_decoration(row, class);
        self.emit(SessionEvent::ChangeBreakpoint);
    }

    /// Remove a gutter class from `row`.
    pub fn remove_gutter_decoration(&mut self, row: usize, class: &str) {
        self.decorations.remove_gutter_decoration(row, class);
        self.emit(SessionEvent::ChangeBreakpoint);
    }

    /// Replace all breakpoints.
    pub fn set_breakpoints(&mut self, rows: &[usize]) {
        self.decorations.set_breakpoints(rows);
        self.emit(SessionEvent::ChangeBreakpoint);
    }

    /// Remove all breakpoints.
    pub fn clear_breakpoints(&mut self) {
        self.decorations.clear_breakpoints();
        self.emit(SessionEvent::ChangeBreakpoint);
    }

    /// Set a breakpoint on `row`, with `class` or the default one.
    pub fn set_breakpoint(&mut self, row: usize, class: Option<&str>) {
        let class = class.unwrap_or(DEFAULT_BREAKPOINT_CLASS);
        self.decorations.set_breakpoint(row, Some(class));
        self.emit(SessionEvent::ChangeBreakpoint);
    }

    /// Remove the breakpoint on `row`.
    pub fn clear_breakpoint(&mut self, row: usize) {
        self.decorations.clear_breakpoint(row);
        self.emit(SessionEvent::ChangeBreakpoint);
    }

    /// Replace all annotations.
    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.decorations.set_annotations(annotations);
        self.emit(SessionEvent::ChangeAnnotation);
    }

    /// Remove all annotations.
    pub fn clear_annotations(&mut self) {
        self.decorations.clear_annotations();
        self.emit(SessionEvent::ChangeAnnotation);
    }

    // ------------------------------------------------------------------
    // Line widgets
    // ------------------------------------------------------------------

    /// Attached line widgets.
    pub fn line_widgets(&self) -> &LineWidgets {
        &self.line_widgets
    }

    /// Attach a widget below its row, replacing any widget already there.
    pub fn add_line_widget(&mut self, widget: LineWidget) -> Option<LineWidget> {
        self.row_cache.reset(widget.row);
        self.modified = true;
        self.line_widgets.add(widget)
    }

    /// Detach the widget on `row`.
    pub fn remove_line_widget(&mut self, row: usize) -> Option<LineWidget> {
        let widget = self.line_widgets.remove(row)?;
        self.row_cache.reset(row);
        self.modified = true;
        Some(widget)
    }

    // ------------------------------------------------------------------
    // Brackets
    // ------------------------------------------------------------------

    /// Bracket pairs used for matching and toggling folds.
    pub fn bracket_config(&self) -> &BracketConfig {
        &self.brackets
    }

    /// Replace the bracket pairs.
    pub fn set_bracket_config(&mut self, brackets: BracketConfig) {
        self.brackets = brackets;
    }

    /// Partner of the bracket just before `pos`.
    pub fn find_matching_bracket(&self, pos: Position) -> Option<Position> {
        crate::bracket::find_matching_bracket(&self.doc, &self.brackets, pos)
    }

    /// Opening partner of `bracket`, which sits just before `pos`.
    pub fn find_opening_bracket(&self, bracket: char, pos: Position) -> Option<Position> {
        crate::bracket::find_opening_bracket(&self.doc, &self.brackets, bracket, pos)
    }

    /// Closing partner of `bracket`, which sits just before `pos`.
    pub fn find_closing_bracket(&self, bracket: char, pos: Position) -> Option<Position> {
        crate::bracket::find_closing_bracket(&self.doc, &self.brackets, bracket, pos)
    }

    /// Range between the bracket next to `pos` and its partner.
    pub fn bracket_range(&self, pos: Position) -> Option<Range> {
        crate::bracket::bracket_range(&self.doc, &self.brackets, pos)
    }

    // ------------------------------------------------------------------
    // Width
    // ------------------------------------------------------------------

    /// Width of the widest visible row, or of the widest line widget if wider.
    pub fn screen_width(&mut self) -> usize {
        let width = self.compute_width(false);
        width.max(self.line_widgets.max_screen_width())
    }

    /// Measure the widest visible row. Rows hidden inside folds are skipped; in wrap mode
    /// the width is the wrap limit.
    pub fn compute_width(&mut self, force: bool) -> usize {
        if !self.modified && !force {
            return self.cached_width;
        }
        self.modified = false;
        if self.use_wrap_mode {
            self.cached_width = self.wrap_limit;
            return self.cached_width;
        }

        let rows = self.doc.len();
        self.row_length_cache.resize(rows, None);
        let mut longest = 0;
        let mut fold_index = 0;
        let mut row = 0;
        while row < rows {
            if let Some(line) = self.fold_lines.get(fold_index)
                && row > line.start().row
            {
                row = line.end().row + 1;
                fold_index += 1;
                continue;
            }
            let width = match self.row_length_cache[row] {
                Some(width) => width,
                None => {
                    let width =
                        layout::string_screen_width(self.doc.line(row), None, 0, self.tab_size).0;
                    self.row_length_cache[row] = Some(width);
                    width
                }
            };
            longest = longest.max(width);
            row += 1;
        }
        self.cached_width = longest;
        longest
    }

    /// Signal that a tokenizer re-tokenized rows `first..=last`.
    ///
    /// Fold widgets from `first` on are recomputed lazily.
    pub fn tokenizer_update(&mut self, first: usize, last: usize) {
        if first != last
            && let Some(cache) = &mut self.fold_widgets
        {
            cache.truncate(first);
        }
        self.emit(SessionEvent::TokenizerUpdate { first, last });
    }
}

/// The range a host should select after replaying `deltas`.
///
/// Inserted text is selected; a removal collapses to where the text was. `last` is the
/// result for the groups replayed before, adjusted so adjacent replays extend each other.
fn undo_selection(deltas: &[Delta], is_undo: bool, last: Option<Range>) -> Option<Range> {
    let inserts = |delta: &Delta| delta.is_insert() != is_undo;
    let Some(first) = deltas.first() else {
        return last;
    };
    let mut range = if inserts(first) {
        first.range()
    } else {
        Range::at(first.range().start)
    };

    for delta in &deltas[1..] {
        let delta_range = delta.range();
        if inserts(delta) {
            if range.compare_point(delta_range.start) == Ordering::Less {
                range.start = delta_range.start;
            }
            if range.compare_point(delta_range.end) == Ordering::Greater {
                range.end = delta_range.end;
            }
        } else if range.compare_point(delta_range.start) == Ordering::Less {
            range = Range::at(delta_range.start);
        }
    }

    if let Some(mut last) = last {
        if last.start == range.start {
            let width = range.end.column as isize - range.start.column as isize;
            last.start.column = last.start.column.saturating_add_signed(width);
            last.end.column = last.end.column.saturating_add_signed(width);
        }
        match last.compare_range(&range) {
            crate::range::RangeRelation::OverlapEnd => range.start = last.start,
            crate::range::RangeRelation::OverlapStart => {
                range.end = Position::new(last.end.row, last.start.column);
            }
            _ => {}
        }
    }
    Some(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(session: &mut EditSession) -> Arc<Mutex<Vec<SessionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        session.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    #[test]
    fn test_change_event_follows_edit() {
        let mut session = EditSession::new("abc");
        let events = recorder(&mut session);
        session.insert(Position::new(0, 1), "X");
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SessionEvent::Change { delta: Delta::InsertText { text, .. } } if text == "X"
        ));
        assert_eq!(session.value(), "aXbc");
    }

    #[test]
    fn test_replace_with_same_text_is_silent() {
        let mut session = EditSession::new("hello world");
        let events = recorder(&mut session);
        let range = Range::new(0, 6, 0, 11);
        assert_eq!(session.replace(range, "world"), range.end);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_undo_restores_text_and_selects_insert() {
        let mut session = EditSession::new("one\ntwo");
        session.insert(Position::new(1, 3), "!!");
        session.mark_undo_group();
        let selection = session.undo();
        assert_eq!(session.value(), "one\ntwo");
        assert_eq!(selection, Some(Range::new(1, 3, 1, 3)));
        let selection = session.redo();
        assert_eq!(session.value(), "one\ntwo!!");
        assert_eq!(selection, Some(Range::new(1, 3, 1, 5)));
    }

    #[test]
    fn test_undo_without_mark_flushes_pending() {
        let mut session = EditSession::new("");
        session.insert(Position::new(0, 0), "a");
        session.insert(Position::new(0, 1), "b");
        assert!(session.has_undo());
        session.undo();
        assert_eq!(session.value(), "");
        assert!(!session.has_undo());
        assert!(session.has_redo());
    }

    #[test]
    fn test_merge_undo_deltas() {
        let mut session = EditSession::new("");
        session.insert(Position::new(0, 0), "a");
        session.mark_undo_group();
        session.insert(Position::new(0, 1), "b");
        session.set_merge_undo_deltas(true);
        session.mark_undo_group();
        assert_eq!(session.undo_manager().undo_depth(), 1);
        session.undo();
        assert_eq!(session.value(), "");
    }

    #[test]
    fn test_set_value_resets_history() {
        let mut session = EditSession::new("abc");
        session.insert(Position::new(0, 0), "x");
        session.set_value("new\ntext");
        assert_eq!(session.len(), 2);
        assert!(!session.has_undo());
        assert!(session.undo().is_none());
    }

    #[test]
    fn test_tab_size_validation_and_event() {
        let mut session = EditSession::new("\tx");
        let events = recorder(&mut session);
        assert_eq!(session.set_tab_size(0), Err(SessionError::InvalidTabSize));
        session.set_tab_size(8).unwrap();
        session.set_tab_size(8).unwrap();
        assert_eq!(*events.lock().unwrap(), vec![SessionEvent::ChangeTabSize]);
        assert_eq!(session.compute_width(true), 9);
    }

    #[test]
    fn test_tab_string_and_tab_stops() {
        let mut session = EditSession::new("");
        assert_eq!(session.tab_string(), "    ");
        assert!(session.is_tab_stop(Position::new(0, 8)));
        assert!(!session.is_tab_stop(Position::new(0, 6)));
        session.set_use_soft_tabs(false);
        assert_eq!(session.tab_string(), "\t");
        assert!(!session.is_tab_stop(Position::new(0, 8)));
    }

    #[test]
    fn test_scroll_events_only_on_change() {
        let mut session = EditSession::new("");
        let events = recorder(&mut session);
        session.set_scroll_top(10.0);
        session.set_scroll_top(10.0);
        session.set_scroll_left(f64::NAN);
        assert_eq!(
            *events.lock().unwrap(),
            vec![SessionEvent::ChangeScrollTop { scroll_top: 10.0 }]
        );
    }

    #[test]
    fn test_overwrite_toggle() {
        let mut session = EditSession::new("");
        let events = recorder(&mut session);
        session.toggle_overwrite();
        assert!(session.overwrite());
        session.set_overwrite(true);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_breakpoints_follow_edits() {
        let mut session = EditSession::new("a\nb\nc");
        session.set_breakpoint(2, None);
        session.insert(Position::new(0, 0), "\n");
        let rows: Vec<(usize, &str)> = session.decorations().breakpoints().collect();
        assert_eq!(rows, vec![(3, DEFAULT_BREAKPOINT_CLASS)]);
    }

    #[test]
    fn test_marker_events() {
        let mut session = EditSession::new("abc");
        let events = recorder(&mut session);
        let id = session.highlight_lines(0, 0, None, false);
        assert_eq!(
            session.markers(false).next().map(|m| m.class.as_str()),
            Some(DEFAULT_HIGHLIGHT_CLASS)
        );
        assert!(session.remove_marker(id).is_some());
        assert_eq!(
            *events.lock().unwrap(),
            vec![SessionEvent::ChangeBackMarker, SessionEvent::ChangeBackMarker]
        );
    }

    #[test]
    fn test_compute_width_skips_folded_rows() {
        let mut session = EditSession::new("ab\nthis row is long\ncd");
        assert_eq!(session.screen_width(), 16);
        session
            .add_fold("...", Range::new(0, 1, 2, 1))
            .unwrap();
        assert_eq!(session.screen_width(), 2);
    }

    #[test]
    fn test_options_round_trip() {
        let options = SessionOptions {
            tab_size: 2,
            use_soft_tabs: false,
            overwrite: true,
            ..SessionOptions::default()
        };
        let session = EditSession::with_options("x", &options).unwrap();
        assert_eq!(session.options(), options);
    }
}
