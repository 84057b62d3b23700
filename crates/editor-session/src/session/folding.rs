//! Fold storage and fold widgets.
//!
//! Folds live in `fold_lines`, sorted by row, with no two fold lines sharing a row. Every
//! add and remove refreshes the layout data of the affected fold line and resets the row
//! cache from its first row.

use super::EditSession;
use crate::delta::Delta;
use crate::error::{Result, SessionError};
use crate::fold::Fold;
use crate::fold_line::FoldLine;
use crate::fold_mode::{FoldProvider, FoldStyle, FoldWidget};
use crate::range::{Position, Range, RangeRelation};
use crate::state::{FoldAction, SessionEvent};
use crate::text::{char_len, slice_chars, slice_from, slice_to};
use std::cmp::Ordering;

/// Which fold edge does not count as "at" the fold in [`EditSession::fold_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldEdge {
    /// Both edges count.
    #[default]
    Any,
    /// A point on the fold's start is outside it.
    ExcludeStart,
    /// A point on the fold's end is outside it.
    ExcludeEnd,
}

/// Options for [`EditSession::toggle_fold_widget_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FoldWidgetToggle {
    /// Fold (or unfold) the children of the region instead of the region itself.
    pub children: bool,
    /// Fold every nested region too.
    pub all: bool,
    /// Fold the region's siblings.
    pub siblings: bool,
}

/// Result of [`EditSession::parent_fold_range_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParentFoldRange {
    /// Innermost foldable region above the row that still covers it.
    pub range: Option<Range>,
    /// First foldable region found while scanning upwards.
    pub first_range: Option<Range>,
}

impl EditSession {
    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub(crate) fn fold_line_index(&self, row: usize) -> Option<usize> {
        let i = self.fold_lines.partition_point(|line| line.end().row < row);
        (i < self.fold_lines.len() && self.fold_lines[i].start().row <= row).then_some(i)
    }

    pub(crate) fn next_fold_line_index(&self, row: usize) -> Option<usize> {
        let i = self.fold_lines.partition_point(|line| line.end().row < row);
        (i < self.fold_lines.len()).then_some(i)
    }

    /// All fold lines in document order.
    pub fn fold_lines(&self) -> &[FoldLine] {
        &self.fold_lines
    }

    /// The fold line covering `row`.
    pub fn fold_line(&self, row: usize) -> Option<&FoldLine> {
        self.fold_line_index(row).map(|i| &self.fold_lines[i])
    }

    /// The first fold line covering or following `row`.
    pub fn next_fold_line(&self, row: usize) -> Option<&FoldLine> {
        self.next_fold_line_index(row).map(|i| &self.fold_lines[i])
    }

    fn fold_index_at(&self, row: usize, column: usize, edge: FoldEdge) -> Option<(usize, usize)> {
        let line_index = self.fold_line_index(row)?;
        let fold_index = self.fold_lines[line_index].folds().iter().position(|fold| {
            let range = &fold.range;
            range.contains(row, column)
                && match edge {
                    FoldEdge::Any => true,
                    FoldEdge::ExcludeStart => !range.is_start(row, column),
                    FoldEdge::ExcludeEnd => !range.is_end(row, column),
                }
        })?;
        Some((line_index, fold_index))
    }

    /// The top-level fold containing `(row, column)`.
    pub fn fold_at(&self, row: usize, column: usize, edge: FoldEdge) -> Option<&Fold> {
        let (line, fold) = self.fold_index_at(row, column, edge)?;
        Some(&self.fold_lines[line].folds()[fold])
    }

    fn locate_fold(&self, range: &Range) -> Option<(usize, usize)> {
        let line_index = self.fold_line_index(range.start.row)?;
        let fold_index = self.fold_lines[line_index]
            .folds()
            .iter()
            .position(|fold| fold.range == *range)?;
        Some((line_index, fold_index))
    }

    /// Top-level folds intersecting `range`.
    ///
    /// The range is shrunk by one column at each end before comparing, so folds that only
    /// touch its boundary are not reported.
    pub fn folds_in_range(&self, range: &Range) -> Vec<Fold> {
        let mut found = Vec::new();
        let probe_end = if range.end.column > 0 {
            Position::new(range.end.row, range.end.column - 1)
        } else if range.end.row > 0 {
            Position::new(range.end.row - 1, usize::MAX)
        } else {
            return found;
        };
        let probe = Range::from_points(
            Position::new(range.start.row, range.start.column.saturating_add(1)),
            probe_end,
        );

        for line in &self.fold_lines {
            match line.range().compare_range(&probe) {
                RangeRelation::DisjointAfter => continue,
                RangeRelation::DisjointBefore => break,
                _ => {}
            }
            for fold in line.folds() {
                match fold.range.compare_range(&probe) {
                    RangeRelation::DisjointBefore | RangeRelation::EndInsideStartOutside => break,
                    RangeRelation::DisjointAfter => continue,
                    _ => found.push(fold.clone()),
                }
            }
        }
        found
    }

    /// [`folds_in_range`](Self::folds_in_range) for several ranges, in order.
    pub fn folds_in_ranges(&self, ranges: &[Range]) -> Vec<Fold> {
        ranges
            .iter()
            .flat_map(|range| self.folds_in_range(range))
            .collect()
    }

    /// Every top-level fold in document order.
    pub fn all_folds(&self) -> impl Iterator<Item = &Fold> {
        self.fold_lines.iter().flat_map(|line| line.folds())
    }

    /// Visible text between the folds of the fold line at `(row, column)`.
    ///
    /// Returns the text segment the point lies in (`None` if it is inside a fold). `trim`
    /// keeps only the part before (`Less`) or after (`Greater`) the point; `Equal` keeps the
    /// whole segment.
    pub fn fold_string_at(&self, row: usize, column: usize, trim: Ordering) -> Option<String> {
        let line = self.fold_line(row)?;
        let mut last_end = 0;
        let mut segment = None;
        for fold in line.folds() {
            match fold.range.compare_end(row, column) {
                Ordering::Less => {
                    let text = self.doc.line(fold.range.start.row);
                    segment = Some(slice_chars(text, last_end, fold.range.start.column).to_string());
                    break;
                }
                Ordering::Equal => return None,
                Ordering::Greater => last_end = fold.range.end.column,
            }
        }
        let segment = segment
            .unwrap_or_else(|| slice_from(self.doc.line(line.end().row), last_end).to_string());
        let offset = column.saturating_sub(last_end);
        Some(match trim {
            Ordering::Less => slice_to(&segment, offset).to_string(),
            Ordering::Greater => slice_from(&segment, offset).to_string(),
            Ordering::Equal => segment,
        })
    }

    /// Rows `first..=last` that remain visible with the current folds.
    pub fn folded_row_count(&self, first: usize, last: usize) -> usize {
        let (first, last) = (first as isize, last as isize);
        let mut count = last - first + 1;
        for line in &self.fold_lines {
            let (start, end) = (line.start().row as isize, line.end().row as isize);
            if end >= last {
                if start < last {
                    if start >= first {
                        count -= last - start;
                    } else {
                        count = 0;
                    }
                }
                break;
            } else if end >= first {
                if start >= first {
                    count -= end - start;
                } else {
                    count -= end - first + 1;
                }
            }
        }
        count.max(0) as usize
    }

    /// Returns `true` if `row` is covered by a fold line (its first row included).
    pub fn is_row_folded(&self, row: usize) -> bool {
        self.fold_line_index(row).is_some()
    }

    /// Returns `true` if `row` is hidden inside a fold line.
    pub fn is_row_fully_hidden(&self, row: usize) -> bool {
        self.fold_line(row).is_some_and(|line| line.start().row < row)
    }

    /// First row of the visual line containing `row`.
    pub fn row_fold_start(&self, row: usize) -> usize {
        self.fold_line(row).map_or(row, |line| line.start().row)
    }

    /// Last row of the visual line containing `row`.
    pub fn row_fold_end(&self, row: usize) -> usize {
        self.fold_line(row).map_or(row, |line| line.end().row)
    }

    /// Display text of a fold line, placeholders substituted.
    ///
    /// `end` cuts the text at a document position and `start` drops everything before one;
    /// by default the whole line is returned.
    pub fn fold_display_line(
        &self,
        line: &FoldLine,
        end: Option<Position>,
        start: Option<Position>,
    ) -> String {
        let end = end.unwrap_or_else(|| {
            let row = line.end().row;
            Position::new(row, self.doc.line_len(row))
        });
        let (start_row, start_column) = start.map_or((line.start().row, 0), |p| (p.row, p.column));
        let mut text = String::new();
        line.walk(
            |placeholder, row, column, last_column, _| {
                if row < start_row {
                    return false;
                }
                let mut last_column = last_column;
                if row == start_row {
                    if column < start_column {
                        return false;
                    }
                    last_column = last_column.max(start_column);
                }
                match placeholder {
                    Some(placeholder) => text.push_str(placeholder),
                    None => text.push_str(slice_chars(self.doc.line(row), last_column, column)),
                }
                false
            },
            Some(end),
        );
        text
    }

    /// Display text of the visual line containing `row`.
    pub fn display_line(
        &self,
        row: usize,
        end_column: Option<usize>,
        start: Option<Position>,
    ) -> String {
        match self.fold_line(row) {
            Some(line) => {
                let end = end_column.map(|column| Position::new(row, column));
                self.fold_display_line(line, end, start)
            }
            None => {
                let text = self.doc.line(row);
                let from = start.map_or(0, |p| p.column);
                let to = end_column.unwrap_or_else(|| char_len(text));
                slice_chars(text, from, to).to_string()
            }
        }
    }

    // ------------------------------------------------------------------
    // Adding and removing
    // ------------------------------------------------------------------

    /// Fold `range` behind `placeholder`.
    pub fn add_fold(&mut self, placeholder: impl Into<String>, range: Range) -> Result<Fold> {
        self.insert_fold(Fold::new(range, placeholder))
    }

    /// Add a prepared fold, keeping its children and collapse depth.
    ///
    /// The range is clipped to the document and must cover at least two characters. A fold
    /// inside an existing fold becomes that fold's child; folds inside the new one become
    /// its children. Partial overlaps are rejected before anything changes.
    pub fn insert_fold(&mut self, mut fold: Fold) -> Result<Fold> {
        fold.range = Range::from_points(
            self.doc.clip_position(fold.range.start),
            self.doc.clip_position(fold.range.end),
        );
        let (start, end) = (fold.range.start, fold.range.end);
        let wide_enough = start.row < end.row || (start.row == end.row && start.column + 2 <= end.column);
        if !wide_enough {
            return Err(SessionError::FoldTooSmall);
        }

        let start_fold = self.fold_index_at(start.row, start.column, FoldEdge::ExcludeEnd);
        let end_fold = self.fold_index_at(end.row, end.column, FoldEdge::ExcludeStart);
        if let Some((line, index)) = start_fold
            && end_fold == start_fold
        {
            let parent = &mut self.fold_lines[line].folds_mut()[index];
            if parent.range == fold.range {
                return Ok(parent.clone());
            }
            parent.add_sub_fold(fold.clone())?;
            return Ok(fold);
        }
        if let Some((line, index)) = start_fold
            && !self.fold_lines[line].folds()[index].range.is_start(start.row, start.column)
        {
            return Err(SessionError::FoldOverlap { range: fold.range });
        }
        if let Some((line, index)) = end_fold
            && !self.fold_lines[line].folds()[index].range.is_end(end.row, end.column)
        {
            return Err(SessionError::FoldOverlap { range: fold.range });
        }

        let inner = self.folds_in_range(&fold.range);
        if inner.iter().any(|f| !fold.range.contains_range(&f.range)) {
            return Err(SessionError::FoldOverlap { range: fold.range });
        }
        if !inner.is_empty() {
            self.remove_folds(&inner);
            for child in inner {
                fold.add_sub_fold(child)?;
            }
        }

        let mut target = None;
        for i in 0..self.fold_lines.len() {
            let line = &self.fold_lines[i];
            if end.row == line.start().row {
                self.fold_lines[i].add_fold(fold.clone())?;
                target = Some(i);
                break;
            } else if start.row == line.end().row {
                self.fold_lines[i].add_fold(fold.clone())?;
                target = Some(i);
                if !fold.same_row()
                    && self
                        .fold_lines
                        .get(i + 1)
                        .is_some_and(|next| next.start().row == end.row)
                {
                    let next = self.fold_lines.remove(i + 1);
                    self.fold_lines[i].merge(next)?;
                }
                break;
            } else if end.row <= line.start().row {
                break;
            }
        }
        let index = match target {
            Some(i) => i,
            None => {
                let i = self
                    .fold_lines
                    .partition_point(|line| line.start().row < start.row);
                self.fold_lines.insert(i, FoldLine::new(fold.clone()));
                i
            }
        };

        let first_row = self.fold_lines[index].start().row;
        self.update_layout_rows(first_row, first_row);
        self.row_cache.reset(first_row);
        self.modified = true;
        tracing::trace!(fold = %fold, "fold added");
        self.emit(SessionEvent::ChangeFold {
            action: FoldAction::Add,
            fold: fold.clone(),
        });
        Ok(fold)
    }

    /// Add several folds, skipping any that cannot be placed.
    pub fn add_folds(&mut self, folds: Vec<Fold>) {
        for fold in folds {
            if let Err(err) = self.insert_fold(fold) {
                tracing::debug!(%err, "fold skipped");
            }
        }
    }

    /// Remove a top-level fold (matched by range) and return the stored fold.
    pub fn remove_fold(&mut self, fold: &Fold) -> Option<Fold> {
        let (line_index, fold_index) = self.locate_fold(&fold.range)?;
        let line = &mut self.fold_lines[line_index];
        let (start_row, end_row) = (line.start().row, line.end().row);
        let count = line.folds().len();

        let removed = if count == 1 {
            let mut line = self.fold_lines.remove(line_index);
            line.folds_mut().remove(0)
        } else if fold_index == count - 1 || fold_index == 0 {
            let removed = line.folds_mut().remove(fold_index);
            line.refresh_range();
            removed
        } else if line.folds()[fold_index].same_row() {
            line.folds_mut().remove(fold_index)
        } else {
            let start = line.folds()[fold_index].range.start;
            match line.split(start.row, start.column) {
                Some(mut tail) => {
                    let removed = tail.folds_mut().remove(0);
                    tail.refresh_range();
                    self.fold_lines.insert(line_index + 1, tail);
                    removed
                }
                None => {
                    let removed = line.folds_mut().remove(fold_index);
                    line.refresh_range();
                    removed
                }
            }
        };

        if !self.updating {
            self.update_layout_rows(start_row, end_row);
        }
        self.row_cache.reset(start_row);
        self.modified = true;
        tracing::trace!(fold = %removed, "fold removed");
        self.emit(SessionEvent::ChangeFold {
            action: FoldAction::Remove,
            fold: removed.clone(),
        });
        Some(removed)
    }

    /// Remove several folds.
    pub fn remove_folds(&mut self, folds: &[Fold]) {
        for fold in folds {
            self.remove_fold(fold);
        }
    }

    /// Remove a fold and bring back the folds that were nested in it.
    ///
    /// With a collapse depth, the fold's children are folded again one level shallower.
    pub fn expand_fold(&mut self, fold: &Fold) {
        let Some(fold) = self.remove_fold(fold) else {
            return;
        };
        self.add_folds(fold.restored_sub_folds());
        if fold.collapse_children > 0 {
            self.fold_all(
                Some(fold.range.start.row + 1),
                Some(fold.range.end.row),
                Some(fold.collapse_children - 1),
            );
        }
    }

    /// Expand several folds.
    pub fn expand_folds(&mut self, folds: &[Fold]) {
        for fold in folds {
            self.expand_fold(fold);
        }
    }

    /// Remove the folds intersecting `location` (the whole document when `None`).
    ///
    /// With `expand_inner`, nested folds are dropped along with their parents; otherwise
    /// folds are expanded level by level until nothing folded is left in the range.
    /// Returns the top-level folds that were found first.
    pub fn unfold(&mut self, location: Option<Range>, expand_inner: bool) -> Vec<Fold> {
        let (range, expand_inner) = match location {
            Some(range) => (range, expand_inner),
            None => (Range::new(0, 0, self.doc.len(), 0), true),
        };
        let folds = self.folds_in_range(&range);
        if expand_inner {
            self.remove_folds(&folds);
        } else {
            let mut level = folds.clone();
            while !level.is_empty() {
                self.expand_folds(&level);
                level = self.folds_in_range(&range);
            }
        }
        folds
    }

    // ------------------------------------------------------------------
    // Toggling
    // ------------------------------------------------------------------

    /// Fold or unfold at a selection.
    ///
    /// An empty range expands the fold under the cursor, or folds the bracket block next to
    /// it. A non-empty range expands the folds it touches when `try_to_unfold` is set, expands
    /// a fold it matches exactly, and otherwise folds itself.
    pub fn toggle_fold(&mut self, range: Range, try_to_unfold: bool) -> Result<()> {
        let mut range = range;
        let mut fold = None;

        if range.is_empty() {
            let cursor = range.start;
            if let Some(existing) = self.fold_at(cursor.row, cursor.column, FoldEdge::Any).cloned() {
                self.expand_fold(&existing);
                return Ok(());
            }
            if let Some(bracket) = self.find_matching_bracket(cursor) {
                if range.compare_point(bracket) == Ordering::Greater {
                    range.end = bracket;
                } else {
                    range.start = Position::new(bracket.row, bracket.column + 1);
                    range.end.column = range.end.column.saturating_sub(1);
                }
            } else if let Some(bracket) =
                self.find_matching_bracket(Position::new(cursor.row, cursor.column + 1))
            {
                if range.compare_point(bracket) == Ordering::Greater {
                    range.end = bracket;
                } else {
                    range.start = bracket;
                }
                range.start.column += 1;
            }
        } else {
            let folds = self.folds_in_range(&range);
            if try_to_unfold && !folds.is_empty() {
                self.expand_folds(&folds);
                return Ok(());
            }
            if folds.len() == 1 {
                fold = folds.into_iter().next();
            }
        }

        if fold.is_none() {
            fold = self
                .fold_at(range.start.row, range.start.column, FoldEdge::Any)
                .cloned();
        }
        if let Some(existing) = fold
            && existing.range == range
        {
            self.expand_fold(&existing);
            return Ok(());
        }

        let placeholder = if range.is_multi_line() {
            "...".to_string()
        } else {
            let text = self.doc.text_range(&range);
            if char_len(&text) < 4 {
                return Ok(());
            }
            let head: String = text.trim().chars().take(2).collect();
            head + ".."
        };
        self.add_fold(placeholder, range).map(|_| ())
    }

    // ------------------------------------------------------------------
    // Fold widgets
    // ------------------------------------------------------------------

    /// Current fold style.
    pub fn fold_style(&self) -> FoldStyle {
        self.fold_style
    }

    /// Change the fold style. Switching to manual removes every fold.
    pub fn set_fold_style(&mut self, style: FoldStyle) {
        if self.fold_style == style {
            return;
        }
        self.fold_style = style;
        if style.is_manual() {
            self.unfold(None, true);
        }
        self.reset_fold_widgets();
        self.emit(SessionEvent::ChangeFoldStyle);
    }

    /// Install the provider that detects foldable regions.
    pub fn set_fold_provider<P>(&mut self, provider: P)
    where
        P: FoldProvider + 'static,
    {
        self.fold_provider = Some(Box::new(provider));
        self.reset_fold_widgets();
    }

    /// Remove the fold provider. Existing folds stay.
    pub fn clear_fold_provider(&mut self) {
        self.fold_provider = None;
        self.reset_fold_widgets();
    }

    /// Returns `true` if fold widgets are being reported.
    pub fn has_fold_widgets(&self) -> bool {
        self.fold_widgets.is_some()
    }

    fn reset_fold_widgets(&mut self) {
        self.fold_widgets = (self.fold_provider.is_some() && !self.fold_style.is_manual())
            .then(Vec::new);
    }

    /// Fold widget of `row`, straight from the provider.
    pub fn fold_widget(&self, row: usize) -> Option<FoldWidget> {
        if self.fold_style.is_manual() {
            return None;
        }
        self.fold_provider
            .as_ref()?
            .fold_widget(&self.doc, self.fold_style, row)
    }

    /// Foldable region starting (or ending) at `row`.
    pub fn fold_widget_range(&self, row: usize) -> Option<Range> {
        if self.fold_style.is_manual() {
            return None;
        }
        self.fold_provider
            .as_ref()?
            .fold_widget_range(&self.doc, self.fold_style, row)
    }

    /// Fold widget of `row`, answered from the widget cache when possible.
    pub fn cached_fold_widget(&mut self, row: usize) -> Option<FoldWidget> {
        if let Some(Some(widget)) = self.fold_widgets.as_ref()?.get(row) {
            return *widget;
        }
        let widget = self.fold_widget(row);
        if let Some(cache) = &mut self.fold_widgets {
            if cache.len() <= row {
                cache.resize(row + 1, None);
            }
            cache[row] = Some(widget);
        }
        widget
    }

    /// Forget cached widgets on the rows `delta` touched and realign the rest.
    pub(crate) fn update_fold_widgets(&mut self, delta: &Delta) {
        let Some(cache) = &mut self.fold_widgets else {
            return;
        };
        let range = delta.range();
        let first = range.start.row;
        let len = range.end.row - first;
        if first >= cache.len() {
            return;
        }
        if len == 0 {
            cache[first] = None;
        } else if delta.is_remove() {
            let end = (first + len + 1).min(cache.len());
            cache.splice(first..end, [None]);
        } else {
            cache.splice(first..=first, std::iter::repeat_n(None, len + 1));
        }
    }

    /// Fold every multi-row region found between `start_row` and `end_row`.
    ///
    /// Each new fold remembers `depth` (default 100000) so expanding it folds its children
    /// again. Does nothing without fold widgets.
    pub fn fold_all(&mut self, start_row: Option<usize>, end_row: Option<usize>, depth: Option<usize>) {
        if self.fold_widgets.is_none() {
            return;
        }
        let depth = depth.unwrap_or(100_000);
        let start_row = start_row.unwrap_or(0);
        let end_row = end_row.unwrap_or(self.doc.len());

        let mut row = start_row;
        while row < end_row {
            if self.cached_fold_widget(row) != Some(FoldWidget::Start) {
                row += 1;
                continue;
            }
            if let Some(range) = self.fold_widget_range(row)
                && range.is_multi_line()
                && range.end.row <= end_row
                && range.start.row >= start_row
            {
                row = range.end.row;
                let mut fold = Fold::new(range, "...");
                fold.collapse_children = depth;
                if let Err(err) = self.insert_fold(fold) {
                    tracing::trace!(%err, row, "fold_all skipped region");
                }
            }
            row += 1;
        }
    }

    /// Find the foldable region enclosing `row` by scanning upwards.
    ///
    /// With `ignore_current`, a row that has its own widget reports nothing.
    pub fn parent_fold_range_data(&mut self, row: usize, ignore_current: bool) -> ParentFoldRange {
        let mut data = ParentFoldRange::default();
        if self.fold_widgets.is_none() || (ignore_current && self.cached_fold_widget(row).is_some()) {
            return data;
        }
        for candidate in (0..row).rev() {
            if self.cached_fold_widget(candidate) != Some(FoldWidget::Start) {
                continue;
            }
            let range = self.fold_widget_range(candidate);
            if data.first_range.is_none() {
                data.first_range = range;
            }
            if let Some(range) = range
                && range.end.row >= row
            {
                data.range = Some(range);
                break;
            }
        }
        data
    }

    /// Act on the fold widget of `row`: expand its fold, or fold its region.
    ///
    /// Returns the range that was folded or unfolded.
    pub fn toggle_fold_widget_at(&mut self, row: usize, options: FoldWidgetToggle) -> Option<Range> {
        if self.fold_widgets.is_none() {
            return None;
        }
        let widget = self.fold_widget(row);
        let (column, edge) = if widget == Some(FoldWidget::End) {
            (0, FoldEdge::ExcludeStart)
        } else {
            (self.doc.line_len(row), FoldEdge::ExcludeEnd)
        };
        if let Some(fold) = self.fold_at(row, column, edge).cloned() {
            if options.children || options.all {
                self.remove_fold(&fold);
            } else {
                self.expand_fold(&fold);
            }
            return Some(fold.range);
        }

        let range = self.fold_widget_range(row);
        if let Some(range) = range
            && !range.is_multi_line()
            && let Some(fold) = self
                .fold_at(range.start.row, range.start.column, FoldEdge::ExcludeEnd)
                .cloned()
            && fold.range == range
        {
            self.remove_fold(&fold);
            return Some(range);
        }

        let depth = if options.all { 10_000 } else { 0 };
        if options.siblings {
            let data = self.parent_fold_range_data(row, false);
            let (start, end) = match data.range {
                Some(parent) => (Some(parent.start.row + 1), Some(parent.end.row)),
                None => (None, None),
            };
            self.fold_all(start, end, Some(depth));
        } else if options.children {
            let end = range.map_or(self.doc.len(), |r| r.end.row);
            self.fold_all(Some(row + 1), Some(end), Some(depth));
        } else if let Some(range) = range {
            let mut fold = Fold::new(range, "...");
            if options.all {
                fold.collapse_children = depth;
            }
            if let Err(err) = self.insert_fold(fold) {
                tracing::debug!(%err, row, "fold widget region not folded");
            }
        }
        range
    }

    /// Toggle the fold widget on `row`, falling back to the enclosing region.
    pub fn toggle_fold_widget(&mut self, row: usize) {
        let row = self.row_fold_start(row);
        if self.toggle_fold_widget_at(row, FoldWidgetToggle::default()).is_some() {
            return;
        }
        let data = self.parent_fold_range_data(row, true);
        let Some(range) = data.range.or(data.first_range) else {
            return;
        };
        let row = range.start.row;
        let column = self.doc.line_len(row);
        match self.fold_at(row, column, FoldEdge::ExcludeEnd).cloned() {
            Some(fold) => {
                self.remove_fold(&fold);
            }
            None => {
                if let Err(err) = self.add_fold("...", range) {
                    tracing::debug!(%err, row, "enclosing region not folded");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold_mode::BraceFoldProvider;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "fn main() {\n    let v = [\n        1,\n    ];\n}\nx";

    fn ranges(session: &EditSession) -> Vec<Range> {
        session.all_folds().map(|f| f.range).collect()
    }

    #[test]
    fn test_add_fold_rejects_small_and_overlapping() {
        let mut session = EditSession::new("abcdefghij\nklmnop");
        assert_eq!(
            session.add_fold("..", Range::new(0, 2, 0, 3)),
            Err(SessionError::FoldTooSmall)
        );
        session.add_fold("..", Range::new(0, 2, 0, 6)).unwrap();
        let err = session.add_fold("..", Range::new(0, 4, 0, 8)).unwrap_err();
        assert!(matches!(err, SessionError::FoldOverlap { .. }));
        assert_eq!(ranges(&session), vec![Range::new(0, 2, 0, 6)]);
    }

    #[test]
    fn test_add_same_fold_returns_existing() {
        let mut session = EditSession::new("abcdefghij");
        session.add_fold("a", Range::new(0, 2, 0, 6)).unwrap();
        let again = session.add_fold("b", Range::new(0, 2, 0, 6)).unwrap();
        assert_eq!(again.placeholder, "a");
        assert_eq!(session.all_folds().count(), 1);
    }

    #[test]
    fn test_covering_fold_adopts_and_expand_restores() {
        let mut session = EditSession::new("0123456789\nabcdefghij\nABCDEFGHIJ");
        session.add_fold("in", Range::new(1, 2, 1, 5)).unwrap();
        session.add_fold("out", Range::new(0, 5, 2, 3)).unwrap();
        assert_eq!(ranges(&session), vec![Range::new(0, 5, 2, 3)]);

        let outer = session.fold_at(1, 0, FoldEdge::Any).cloned().unwrap();
        assert_eq!(outer.sub_folds.len(), 1);
        session.expand_fold(&outer);
        assert_eq!(ranges(&session), vec![Range::new(1, 2, 1, 5)]);
    }

    #[test]
    fn test_fold_inside_existing_becomes_child() {
        let mut session = EditSession::new("0123456789\nabcdefghij\nABCDEFGHIJ");
        session.add_fold("out", Range::new(0, 5, 2, 3)).unwrap();
        session.add_fold("in", Range::new(1, 2, 1, 5)).unwrap();
        assert_eq!(ranges(&session), vec![Range::new(0, 5, 2, 3)]);
        let outer = session.fold_at(0, 6, FoldEdge::Any).unwrap();
        assert_eq!(outer.restored_sub_folds()[0].range, Range::new(1, 2, 1, 5));
    }

    #[test]
    fn test_folds_in_range_ignores_touching_folds() {
        let mut session = EditSession::new("abcdefghijklmnop");
        session.add_fold("..", Range::new(0, 2, 0, 5)).unwrap();
        session.add_fold("..", Range::new(0, 8, 0, 12)).unwrap();
        assert!(session.folds_in_range(&Range::new(0, 5, 0, 8)).is_empty());
        assert_eq!(session.folds_in_range(&Range::new(0, 4, 0, 9)).len(), 2);
        assert_eq!(session.folds_in_range(&Range::new(0, 0, 1, 0)).len(), 2);
    }

    #[test]
    fn test_folds_on_one_visual_line_share_fold_line() {
        let mut session = EditSession::new("a {\n b\n} c {\n d\n}\ne");
        session.add_fold("...", Range::new(0, 3, 2, 0)).unwrap();
        session.add_fold("...", Range::new(2, 5, 4, 0)).unwrap();
        assert_eq!(session.fold_lines().len(), 1);
        assert_eq!(session.fold_lines()[0].range(), Range::new(0, 3, 4, 0));
        assert_eq!(session.display_line(0, None, None), "a {...} c {...}");
        assert_eq!(session.row_fold_end(1), 4);
        assert!(session.is_row_fully_hidden(3));
        assert!(!session.is_row_fully_hidden(0));
        assert_eq!(session.folded_row_count(0, 5), 2);
    }

    #[test]
    fn test_remove_middle_multi_row_fold_splits_line() {
        let mut session = EditSession::new("a(\n)b(\n)c(\n)d");
        session.add_fold("1", Range::new(0, 2, 1, 0)).unwrap();
        session.add_fold("2", Range::new(1, 3, 2, 0)).unwrap();
        session.add_fold("3", Range::new(2, 3, 3, 0)).unwrap();
        assert_eq!(session.fold_lines().len(), 1);

        let middle = session.fold_at(1, 4, FoldEdge::Any).cloned().unwrap();
        session.remove_fold(&middle);
        let lines: Vec<Range> = session.fold_lines().iter().map(FoldLine::range).collect();
        assert_eq!(lines, vec![Range::new(0, 2, 1, 0), Range::new(2, 3, 3, 0)]);
    }

    #[test]
    fn test_fold_string_at() {
        let mut session = EditSession::new("abcdefghijklmnop");
        session.add_fold("..", Range::new(0, 2, 0, 5)).unwrap();
        session.add_fold("..", Range::new(0, 8, 0, 12)).unwrap();
        assert_eq!(session.fold_string_at(0, 6, Ordering::Equal).as_deref(), Some("fgh"));
        assert_eq!(session.fold_string_at(0, 6, Ordering::Less).as_deref(), Some("f"));
        assert_eq!(session.fold_string_at(0, 6, Ordering::Greater).as_deref(), Some("gh"));
        assert_eq!(session.fold_string_at(0, 3, Ordering::Equal), None);
        assert_eq!(session.fold_string_at(0, 14, Ordering::Equal).as_deref(), Some("mnop"));
    }

    #[test]
    fn test_toggle_fold_on_bracket() {
        let mut session = EditSession::new("f {\n  body\n}");
        session.toggle_fold(Range::new(0, 3, 0, 3), false).unwrap();
        assert_eq!(ranges(&session), vec![Range::new(0, 3, 2, 0)]);
        session.toggle_fold(Range::new(1, 1, 1, 1), false).unwrap();
        assert!(ranges(&session).is_empty());
    }

    #[test]
    fn test_toggle_fold_on_selection() {
        let mut session = EditSession::new("let value = compute();");
        session.toggle_fold(Range::new(0, 12, 0, 21), false).unwrap();
        let fold = session.all_folds().next().cloned().unwrap();
        assert_eq!(fold.placeholder, "co..");
        session.toggle_fold(Range::new(0, 12, 0, 21), false).unwrap();
        assert_eq!(session.all_folds().count(), 0);
        session.toggle_fold(Range::new(0, 0, 0, 2), false).unwrap();
        assert_eq!(session.all_folds().count(), 0);
    }

    #[test]
    fn test_fold_all_and_expand_one_level() {
        let mut session = EditSession::new(SOURCE);
        session.set_fold_provider(BraceFoldProvider::cstyle());
        session.fold_all(None, None, Some(1));
        assert_eq!(ranges(&session), vec![Range::new(0, 11, 4, 0)]);

        let outer = session.all_folds().next().cloned().unwrap();
        session.expand_fold(&outer);
        assert_eq!(ranges(&session), vec![Range::new(1, 13, 3, 4)]);
    }

    #[test]
    fn test_manual_style_unfolds_everything() {
        let mut session = EditSession::new(SOURCE);
        session.set_fold_provider(BraceFoldProvider::cstyle());
        session.add_fold("...", Range::new(1, 13, 3, 4)).unwrap();
        session.set_fold_style(FoldStyle::Manual);
        assert_eq!(session.all_folds().count(), 0);
        assert!(!session.has_fold_widgets());
        assert_eq!(session.fold_widget(0), None);
    }

    #[test]
    fn test_toggle_fold_widget() {
        let mut session = EditSession::new(SOURCE);
        session.set_fold_provider(BraceFoldProvider::cstyle());
        assert_eq!(
            session.toggle_fold_widget_at(1, FoldWidgetToggle::default()),
            Some(Range::new(1, 13, 3, 4))
        );
        assert!(session.is_row_folded(2));
        session.toggle_fold_widget(1);
        assert!(!session.is_row_folded(2));

        // Row 2 has no widget of its own: the enclosing array gets folded.
        session.toggle_fold_widget(2);
        assert_eq!(ranges(&session), vec![Range::new(1, 13, 3, 4)]);
    }

    #[test]
    fn test_parent_fold_range_data() {
        let mut session = EditSession::new(SOURCE);
        session.set_fold_provider(BraceFoldProvider::cstyle());
        let data = session.parent_fold_range_data(2, false);
        assert_eq!(data.range, Some(Range::new(1, 13, 3, 4)));
        assert_eq!(data.first_range, Some(Range::new(1, 13, 3, 4)));
        let data = session.parent_fold_range_data(1, true);
        assert_eq!(data, ParentFoldRange::default());
    }

    #[test]
    fn test_widget_cache_follows_edits() {
        let mut session = EditSession::new(SOURCE);
        session.set_fold_provider(BraceFoldProvider::cstyle());
        assert_eq!(session.cached_fold_widget(1), Some(FoldWidget::Start));
        session.insert(Position::new(0, 0), "// header\n");
        assert_eq!(session.cached_fold_widget(1), Some(FoldWidget::Start));
        assert_eq!(session.cached_fold_widget(2), Some(FoldWidget::Start));
        assert_eq!(session.cached_fold_widget(3), None);
    }

    #[test]
    fn test_unfold_level_by_level() {
        let mut session = EditSession::new("0123456789\nabcdefghij\nABCDEFGHIJ");
        session.add_fold("in", Range::new(1, 2, 1, 5)).unwrap();
        session.add_fold("out", Range::new(0, 5, 2, 3)).unwrap();
        let found = session.unfold(Some(Range::new(1, 0, 1, 9)), false);
        assert_eq!(found.len(), 1);
        assert_eq!(session.all_folds().count(), 0);
    }
}
