//! Markers, gutter decorations, breakpoints and annotations.
//!
//! These are host-owned overlays on the document. The session stores them and keeps the
//! row-keyed ones (gutter decorations, breakpoints, annotations) aligned with rows as lines
//! are inserted and removed. Marker ranges are stored as given; hosts that want markers to
//! track edits re-add them from [`Anchor`](crate::Anchor)s.

use crate::delta::Delta;
use crate::range::Range;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Class used by [`Decorations::set_breakpoints`].
pub const DEFAULT_BREAKPOINT_CLASS: &str = "ace_breakpoint";

/// Class used by [`EditSession::highlight_lines`](crate::EditSession::highlight_lines).
pub const DEFAULT_HIGHLIGHT_CLASS: &str = "ace_step";

/// Marker handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

/// How a marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    /// Covers the text of each row in the range.
    #[default]
    Line,
    /// Covers whole rows, edge to edge.
    FullLine,
    /// Covers whole screen rows.
    ScreenLine,
    /// Covers exactly the text in the range.
    Text,
}

/// A highlighted range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Handle assigned when the marker was added.
    pub id: MarkerId,
    /// Highlighted range.
    pub range: Range,
    /// Style class.
    pub class: String,
    /// Drawing mode.
    pub kind: MarkerKind,
    /// Drawn in front of the text instead of behind it.
    pub in_front: bool,
}

/// Annotation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Errors.
    Error,
    /// Warnings.
    Warning,
    /// Informational messages.
    Info,
}

/// A gutter message attached to a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotated row.
    pub row: usize,
    /// Optional column within the row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Message text.
    pub text: String,
    /// Severity.
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
}

fn remap<T>(map: &mut BTreeMap<usize, T>, delta: &Delta) {
    if delta.range().start.row == delta.range().end.row {
        return;
    }
    let old = std::mem::take(map);
    for (row, value) in old {
        if let Some(row) = delta.map_row(row) {
            map.insert(row, value);
        }
    }
}

/// Storage for all overlays.
#[derive(Debug, Clone, Default)]
pub struct Decorations {
    front_markers: BTreeMap<MarkerId, Marker>,
    back_markers: BTreeMap<MarkerId, Marker>,
    /// Last id handed out; ids start at 1.
    next_marker: u64,
    gutter: BTreeMap<usize, String>,
    breakpoints: BTreeMap<usize, String>,
    annotations: Vec<Annotation>,
}

impl Decorations {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker and return its id.
    pub fn add_marker(
        &mut self,
        range: Range,
        class: impl Into<String>,
        kind: MarkerKind,
        in_front: bool,
    ) -> MarkerId {
        self.next_marker += 1;
        let id = MarkerId(self.next_marker);
        let marker = Marker {
            id,
            range,
            class: class.into(),
            kind,
            in_front,
        };
        if in_front {
            self.front_markers.insert(id, marker);
        } else {
            self.back_markers.insert(id, marker);
        }
        id
    }

    /// Remove a marker, returning it if it existed.
    pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
        self.front_markers
            .remove(&id)
            .or_else(|| self.back_markers.remove(&id))
    }

    /// Markers drawn in front of (`true`) or behind (`false`) the text, by id.
    pub fn markers(&self, in_front: bool) -> impl Iterator<Item = &Marker> {
        if in_front {
            self.front_markers.values()
        } else {
            self.back_markers.values()
        }
    }

    /// Append `class` to the gutter decoration of `row`.
    pub fn add_gutter_decoration(&mut self, row: usize, class: &str) {
        let entry = self.gutter.entry(row).or_default();
        entry.push(' ');
        entry.push_str(class);
    }

    /// Remove `class` from the gutter decoration of `row`.
    pub fn remove_gutter_decoration(&mut self, row: usize, class: &str) {
        if let Some(entry) = self.gutter.get_mut(&row) {
            *entry = entry.replacen(&format!(" {class}"), "", 1);
            if entry.is_empty() {
                self.gutter.remove(&row);
            }
        }
    }

    /// Gutter classes of `row`, space-prefixed.
    pub fn gutter_decoration(&self, row: usize) -> Option<&str> {
        self.gutter.get(&row).map(String::as_str)
    }

    /// Replace all breakpoints with [`DEFAULT_BREAKPOINT_CLASS`] on `rows`.
    pub fn set_breakpoints(&mut self, rows: &[usize]) {
        self.breakpoints = rows
            .iter()
            .map(|&row| (row, DEFAULT_BREAKPOINT_CLASS.to_string()))
            .collect();
    }

    /// Remove every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Set the breakpoint class of `row`; `None` removes the breakpoint.
    pub fn set_breakpoint(&mut self, row: usize, class: Option<&str>) {
        match class {
            Some(class) => {
                self.breakpoints.insert(row, class.to_string());
            }
            None => {
                self.breakpoints.remove(&row);
            }
        }
    }

    /// Remove the breakpoint on `row`.
    pub fn clear_breakpoint(&mut self, row: usize) {
        self.breakpoints.remove(&row);
    }

    /// Breakpoints as `(row, class)` pairs in row order.
    pub fn breakpoints(&self) -> impl Iterator<Item = (usize, &str)> {
        self.breakpoints.iter().map(|(row, class)| (*row, class.as_str()))
    }

    /// Replace all annotations.
    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    /// Remove all annotations.
    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    /// Current annotations.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Keep row-keyed state aligned with an applied delta.
    ///
    /// Rows whose content was merged away lose their breakpoints and annotations. Returns
    /// `(gutter_changed, annotations_changed)`.
    pub(crate) fn update_on_change(&mut self, delta: &Delta) -> (bool, bool) {
        let range = delta.range();
        if range.start.row == range.end.row {
            return (false, false);
        }
        let gutter_changed = !self.breakpoints.is_empty() || !self.gutter.is_empty();
        remap(&mut self.breakpoints, delta);
        remap(&mut self.gutter, delta);

        let annotations_changed = !self.annotations.is_empty();
        self.annotations.retain_mut(|a| match delta.map_row(a.row) {
            Some(row) => {
                a.row = row;
                true
            }
            None => false,
        });
        (gutter_changed, annotations_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn insert_lines(row: usize, count: usize) -> Delta {
        Delta::InsertLines {
            range: Range::new(row, 0, row + count, 0),
            lines: vec![String::new(); count],
        }
    }

    #[test]
    fn test_markers_get_increasing_ids() {
        let mut d = Decorations::new();
        let a = d.add_marker(Range::new(0, 0, 0, 3), "hl", MarkerKind::Text, false);
        let b = d.add_marker(Range::new(1, 0, 1, 3), "hl", MarkerKind::Line, true);
        assert_eq!(a, MarkerId(1));
        assert_eq!(b, MarkerId(2));
        assert_eq!(d.markers(false).count(), 1);
        assert_eq!(d.markers(true).next().map(|m| m.id), Some(b));
        assert!(d.remove_marker(a).is_some());
        assert!(d.remove_marker(a).is_none());
    }

    #[test]
    fn test_gutter_decorations_accumulate() {
        let mut d = Decorations::new();
        d.add_gutter_decoration(2, "a");
        d.add_gutter_decoration(2, "b");
        assert_eq!(d.gutter_decoration(2), Some(" a b"));
        d.remove_gutter_decoration(2, "a");
        assert_eq!(d.gutter_decoration(2), Some(" b"));
        d.remove_gutter_decoration(2, "b");
        assert_eq!(d.gutter_decoration(2), None);
    }

    #[test]
    fn test_breakpoints_follow_inserted_lines() {
        let mut d = Decorations::new();
        d.set_breakpoints(&[1, 4]);
        d.update_on_change(&insert_lines(2, 3));
        let rows: Vec<usize> = d.breakpoints().map(|(r, _)| r).collect();
        assert_eq!(rows, vec![1, 7]);
    }

    #[test]
    fn test_removed_rows_drop_row_state() {
        let mut d = Decorations::new();
        d.set_breakpoint(1, Some("bp"));
        d.set_breakpoint(3, Some("bp"));
        d.set_annotations(vec![Annotation {
            row: 2,
            column: None,
            text: "unused".into(),
            kind: AnnotationKind::Warning,
        }]);
        let delta = Delta::RemoveLines {
            range: Range::new(1, 0, 3, 0),
            lines: vec![String::new(); 2],
        };
        assert_eq!(d.update_on_change(&delta), (true, true));
        let rows: Vec<usize> = d.breakpoints().map(|(r, _)| r).collect();
        assert_eq!(rows, vec![1]);
        assert!(d.annotations().is_empty());
    }

    #[test]
    fn test_joining_rows_keeps_start_row() {
        let mut d = Decorations::new();
        d.set_breakpoints(&[0, 1, 2]);
        let delta = Delta::RemoveText {
            range: Range::new(0, 3, 1, 0),
            text: "\n".into(),
        };
        d.update_on_change(&delta);
        let rows: Vec<usize> = d.breakpoints().map(|(r, _)| r).collect();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn test_annotation_serde() {
        let a: Annotation =
            serde_json::from_str(r#"{"row":3,"text":"oops","type":"error"}"#).unwrap();
        assert_eq!(a.kind, AnnotationKind::Error);
        assert_eq!(a.column, None);
    }
}
