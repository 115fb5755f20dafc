//! Deciding which tiles need another page.

use crate::cache::{FeatureCache, PageToken};
use crate::coord::Tile;

/// Per-tile budgets beyond which no further pages are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLimits {
    pub max_features_per_tile: usize,
    pub max_bytes_per_tile: u64,
}

/// One tile to fetch and the page to start from.
///
/// Rebuilt from cache state at the start of every load step.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub tile: Tile,
    /// `None` fetches the first page.
    pub page_start: Option<PageToken>,
}

/// Builds the fetch list for `tiles`, preserving their order.
///
/// - Tiles with no cache entry are fetched from the first page.
/// - Tiles with a continuation cursor are fetched from it while both the
///   feature count and byte size are still within `limits`.
/// - Exhausted tiles and tiles over budget are skipped.
pub fn plan_requests(tiles: &[Tile], cache: &FeatureCache, limits: &LoadLimits) -> Vec<LoadRequest> {
    tiles
        .iter()
        .filter_map(|tile| match cache.get(&tile.key()) {
            None => Some(LoadRequest {
                tile: *tile,
                page_start: None,
            }),
            Some(entry) => {
                let within_limits = entry.feature_count <= limits.max_features_per_tile
                    && entry.byte_size <= limits.max_bytes_per_tile;
                match entry.cursor.token() {
                    Some(token) if within_limits => Some(LoadRequest {
                        tile: *tile,
                        page_start: Some(token.clone()),
                    }),
                    _ => None,
                }
            }
        })
        .collect()
}
