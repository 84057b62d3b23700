//! Sparse document-row/screen-row index.
//!
//! Coordinate conversion walks rows from the top of the document. The cache remembers
//! `(doc_row, screen_row)` pairs seen during earlier walks so later queries can start from
//! the nearest known pair. Both columns are strictly increasing; the cache is always a prefix
//! of the walk from row 0, so it is only extended by walks that start at its last entry.

/// One remembered row pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCacheEntry {
    /// Document row at which a screen row begins.
    pub doc_row: usize,
    /// Screen row on which `doc_row` begins.
    pub screen_row: usize,
}

/// Starting point returned by the lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CacheStart {
    pub(crate) entry: RowCacheEntry,
    /// Whether the walk from `entry` should append the rows it visits.
    pub(crate) extend: bool,
}

/// Two parallel, monotonically increasing row arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCache {
    doc_rows: Vec<usize>,
    screen_rows: Vec<usize>,
}

/// Index of `value` in the sorted `rows`, or of the greatest element below it.
fn floor_index(rows: &[usize], value: usize) -> Option<usize> {
    match rows.binary_search(&value) {
        Ok(i) => Some(i),
        Err(0) => None,
        Err(i) => Some(i - 1),
    }
}

impl RowCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.doc_rows.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.doc_rows.is_empty()
    }

    /// Cached pairs in order.
    pub fn entries(&self) -> impl Iterator<Item = RowCacheEntry> + '_ {
        self.doc_rows
            .iter()
            .zip(&self.screen_rows)
            .map(|(&doc_row, &screen_row)| RowCacheEntry { doc_row, screen_row })
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.doc_rows.clear();
        self.screen_rows.clear();
    }

    /// Drop every entry after `doc_row`. Entries at or before it stay valid because a
    /// change at `doc_row` never moves the screen row on which `doc_row` begins. The row
    /// must still exist after the change.
    pub fn reset(&mut self, doc_row: usize) {
        if doc_row == 0 {
            self.clear();
            return;
        }
        let keep = floor_index(&self.doc_rows, doc_row).map_or(0, |i| i + 1);
        if keep < self.doc_rows.len() {
            tracing::trace!(doc_row, dropped = self.doc_rows.len() - keep, "row cache reset");
            self.doc_rows.truncate(keep);
            self.screen_rows.truncate(keep);
        }
    }

    pub(crate) fn push(&mut self, doc_row: usize, screen_row: usize) {
        self.doc_rows.push(doc_row);
        self.screen_rows.push(screen_row);
    }

    /// Nearest cached pair at or before `screen_row`.
    pub(crate) fn lookup_screen(&self, screen_row: usize) -> CacheStart {
        self.lookup(&self.screen_rows, screen_row)
    }

    /// Nearest cached pair at or before `doc_row`.
    pub(crate) fn lookup_doc(&self, doc_row: usize) -> CacheStart {
        self.lookup(&self.doc_rows, doc_row)
    }

    fn lookup(&self, rows: &[usize], value: usize) -> CacheStart {
        let origin = RowCacheEntry {
            doc_row: 0,
            screen_row: 0,
        };
        match (floor_index(rows, value), rows.last()) {
            (Some(i), Some(&last)) => CacheStart {
                entry: RowCacheEntry {
                    doc_row: self.doc_rows[i],
                    screen_row: self.screen_rows[i],
                },
                extend: value > last,
            },
            _ => CacheStart {
                entry: origin,
                extend: rows.is_empty(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RowCache {
        let mut cache = RowCache::new();
        cache.push(1, 1);
        cache.push(2, 3);
        cache.push(5, 4);
        cache
    }

    #[test]
    fn test_floor_index() {
        assert_eq!(floor_index(&[1, 3, 4], 0), None);
        assert_eq!(floor_index(&[1, 3, 4], 3), Some(1));
        assert_eq!(floor_index(&[1, 3, 4], 2), Some(0));
        assert_eq!(floor_index(&[1, 3, 4], 9), Some(2));
        assert_eq!(floor_index(&[], 9), None);
    }

    #[test]
    fn test_lookup_extends_only_past_the_end() {
        let cache = filled();
        let start = cache.lookup_doc(3);
        assert_eq!(start.entry, RowCacheEntry { doc_row: 2, screen_row: 3 });
        assert!(!start.extend);

        let start = cache.lookup_doc(9);
        assert_eq!(start.entry.doc_row, 5);
        assert!(start.extend);

        let start = cache.lookup_screen(0);
        assert_eq!(start.entry.doc_row, 0);
        assert!(!start.extend);

        assert!(RowCache::new().lookup_screen(7).extend);
    }

    #[test]
    fn test_reset_keeps_entries_up_to_row() {
        let mut cache = filled();
        cache.reset(2);
        assert_eq!(cache.len(), 2);
        cache.reset(0);
        assert!(cache.is_empty());
    }
}
