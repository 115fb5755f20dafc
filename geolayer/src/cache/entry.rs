//! Per-tile load state.

use std::time::Instant;

use super::cursor::PageCursor;
use crate::feature::Feature;

/// Everything loaded so far for one tile.
///
/// Totals only ever grow: each merge appends a page and adds its size and
/// feature count.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Features in arrival order.
    pub elements: Vec<Feature>,
    /// Sum of the byte sizes reported by the server for each page.
    pub byte_size: u64,
    /// Number of features merged so far.
    pub feature_count: usize,
    /// Where the next page starts. Never `NotStarted` once an entry exists.
    pub cursor: PageCursor,
    /// When the last page was merged.
    pub last_touched_at: Instant,
}

impl CacheEntry {
    pub(crate) fn empty(now: Instant) -> Self {
        Self {
            elements: Vec::new(),
            byte_size: 0,
            feature_count: 0,
            cursor: PageCursor::NotStarted,
            last_touched_at: now,
        }
    }

    pub(crate) fn absorb(
        &mut self,
        features: Vec<Feature>,
        byte_size: u64,
        cursor: PageCursor,
        now: Instant,
    ) {
        self.feature_count += features.len();
        self.byte_size = self.byte_size.saturating_add(byte_size);
        self.elements.extend(features);
        self.cursor = cursor;
        self.last_touched_at = now;
    }

    /// Whether the server has no further pages for this tile.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_exhausted()
    }
}
