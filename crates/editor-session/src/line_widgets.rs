//! Line widgets: host-rendered blocks that occupy extra screen rows below a document row.
//!
//! The session counts a widget's `row_count` into the height of its row. Inside a fold, a
//! widget is only visible when it sits on the fold line's last row and the first row has
//! no widget of its own; the fold then shows it below the collapsed line.

use crate::delta::Delta;
use std::collections::BTreeMap;

/// A block drawn below a document row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWidget {
    /// Row the widget is attached to.
    pub row: usize,
    /// Screen rows the widget occupies.
    pub row_count: usize,
    /// Width in screen columns, if the widget is wider than text.
    pub screen_width: Option<usize>,
}

impl LineWidget {
    /// A widget `row_count` screen rows tall.
    pub fn new(row: usize, row_count: usize) -> Self {
        Self {
            row,
            row_count,
            screen_width: None,
        }
    }

    /// Set the widget width.
    pub fn with_screen_width(mut self, width: usize) -> Self {
        self.screen_width = Some(width);
        self
    }
}

/// Widgets keyed by row, at most one per row.
#[derive(Debug, Clone, Default)]
pub struct LineWidgets {
    rows: BTreeMap<usize, LineWidget>,
}

impl LineWidgets {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a widget, returning the one it replaced.
    pub fn add(&mut self, widget: LineWidget) -> Option<LineWidget> {
        self.rows.insert(widget.row, widget)
    }

    /// Detach the widget on `row`.
    pub fn remove(&mut self, row: usize) -> Option<LineWidget> {
        self.rows.remove(&row)
    }

    /// Widget attached to `row`.
    pub fn get(&self, row: usize) -> Option<&LineWidget> {
        self.rows.get(&row)
    }

    /// Screen rows taken by the widget on `row` (0 without one).
    pub fn row_count(&self, row: usize) -> usize {
        self.rows.get(&row).map_or(0, |w| w.row_count)
    }

    /// All widgets in row order.
    pub fn iter(&self) -> impl Iterator<Item = &LineWidget> {
        self.rows.values()
    }

    /// Returns `true` if no widgets are attached.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest widget.
    pub fn max_screen_width(&self) -> usize {
        self.rows
            .values()
            .filter_map(|w| w.screen_width)
            .max()
            .unwrap_or(0)
    }

    /// Move widgets with their rows. Widgets on removed rows are dropped and returned.
    pub(crate) fn update_on_change(&mut self, delta: &Delta) -> Vec<LineWidget> {
        let range = delta.range();
        if range.start.row == range.end.row || self.rows.is_empty() {
            return Vec::new();
        }
        let mut removed = Vec::new();
        for (_, mut widget) in std::mem::take(&mut self.rows) {
            match delta.map_row(widget.row) {
                Some(row) => {
                    widget.row = row;
                    self.rows.insert(row, widget);
                }
                None => removed.push(widget),
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Range;

    #[test]
    fn test_add_replaces_existing() {
        let mut widgets = LineWidgets::new();
        assert!(widgets.add(LineWidget::new(3, 2)).is_none());
        let old = widgets.add(LineWidget::new(3, 4).with_screen_width(90));
        assert_eq!(old.map(|w| w.row_count), Some(2));
        assert_eq!(widgets.row_count(3), 4);
        assert_eq!(widgets.row_count(2), 0);
        assert_eq!(widgets.max_screen_width(), 90);
    }

    #[test]
    fn test_widgets_follow_rows() {
        let mut widgets = LineWidgets::new();
        widgets.add(LineWidget::new(1, 1));
        widgets.add(LineWidget::new(2, 1));
        widgets.add(LineWidget::new(5, 2));

        let removed = widgets.update_on_change(&Delta::RemoveText {
            range: Range::new(1, 4, 2, 0),
            text: "\n".into(),
        });
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].row, 2);
        assert_eq!(widgets.iter().map(|w| w.row).collect::<Vec<_>>(), vec![1, 4]);

        widgets.update_on_change(&Delta::InsertText {
            range: Range::new(0, 0, 2, 0),
            text: "\n\n".into(),
        });
        assert_eq!(widgets.iter().map(|w| w.row).collect::<Vec<_>>(), vec![3, 6]);
        assert_eq!(widgets.get(6).map(|w| w.row_count), Some(2));
    }
}
