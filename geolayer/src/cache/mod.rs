//! Per-tile feature cache.
//!
//! [`FeatureCache`] keeps one [`CacheEntry`] per tile key holding every page
//! loaded so far, running totals and the pagination cursor. Entries are
//! created and extended by [`FeatureCache::merge`] and removed only by
//! [`FeatureCache::evict_if_over_capacity`].

mod cursor;
mod entry;
mod memory;

pub use cursor::{PageCursor, PageToken};
pub use entry::CacheEntry;
pub use memory::{CacheStats, FeatureCache, EVICTION_COHORT};
