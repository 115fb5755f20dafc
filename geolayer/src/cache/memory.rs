//! In-memory feature cache with cohort eviction.
//!
//! The cache is owned by a single viewport controller and only touched from
//! its polling task, so it uses plain maps and counters rather than locks.
//!
//! # Eviction
//!
//! When the number of entries exceeds the configured maximum, the touch time
//! of the 10th-oldest entry becomes a clip threshold and every entry touched
//! at or before it is dropped. This removes a cohort of roughly ten tiles per
//! eviction rather than trimming to exactly the maximum.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use tracing::debug;

use super::cursor::PageCursor;
use super::entry::CacheEntry;
use crate::coord::{Tile, TileKey};
use crate::feature::Feature;

/// Rank (1-based) of the touch time used as the eviction threshold.
pub const EVICTION_COHORT: usize = 10;

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of tile entries.
    pub entries: usize,
    /// Features held across all entries.
    pub features: usize,
    /// Server-reported bytes held across all entries.
    pub bytes: u64,
    /// Pages merged since creation.
    pub merges: u64,
    /// Entries removed by eviction since creation.
    pub evictions: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles, {} features, {} bytes ({} merges, {} evicted)",
            self.entries, self.features, self.bytes, self.merges, self.evictions
        )
    }
}

/// Keyed store of per-tile load state.
#[derive(Debug, Default)]
pub struct FeatureCache {
    entries: HashMap<TileKey, CacheEntry>,
    merges: u64,
    evictions: u64,
}

impl FeatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for a tile key.
    pub fn get(&self, key: &TileKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold one fetched page into the entry for `key`, creating it if absent.
    ///
    /// Features are appended in arrival order, totals are increased, the
    /// cursor is overwritten and the entry is touched at `now`.
    pub fn merge(
        &mut self,
        key: TileKey,
        features: Vec<Feature>,
        byte_size: u64,
        cursor: PageCursor,
        now: Instant,
    ) {
        self.entries
            .entry(key)
            .or_insert_with(|| CacheEntry::empty(now))
            .absorb(features, byte_size, cursor, now);
        self.merges += 1;
    }

    /// Drop the oldest-touched cohort when more than `max_entries` are held.
    ///
    /// Returns the number of entries removed. Nothing is removed when fewer
    /// than [`EVICTION_COHORT`] entries exist.
    pub fn evict_if_over_capacity(&mut self, max_entries: usize) -> usize {
        if self.entries.len() <= max_entries {
            return 0;
        }

        let mut touched: Vec<Instant> = self.entries.values().map(|e| e.last_touched_at).collect();
        touched.sort_unstable();

        let Some(&clip) = touched.get(EVICTION_COHORT - 1) else {
            return 0;
        };

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_touched_at > clip);
        let removed = before - self.entries.len();
        self.evictions += removed as u64;

        debug!(
            removed,
            remaining = self.entries.len(),
            max_entries,
            "Evicted oldest tiles from feature cache"
        );
        removed
    }

    /// Concatenate cached features for `tiles`, in tile order.
    ///
    /// Tiles without an entry contribute nothing.
    pub fn features_for(&self, tiles: &[Tile]) -> Vec<Feature> {
        tiles
            .iter()
            .filter_map(|tile| self.entries.get(&tile.key()))
            .flat_map(|entry| entry.elements.iter().cloned())
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            features: self.entries.values().map(|e| e.feature_count).sum(),
            bytes: self
                .entries
                .values()
                .fold(0u64, |total, e| total.saturating_add(e.byte_size)),
            merges: self.merges,
            evictions: self.evictions,
        }
    }

    /// Remove every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
