//! Incremental feature loading.
//!
//! [`FeatureLoader`] pages features in per tile, in batches of
//! [`TILE_BATCH_SIZE`] tiles per request. [`GlobalLoader`] ignores tiles and
//! pages through the whole dataset with a single cursor.

mod global;
mod plan;
mod tiled;

pub use global::GlobalLoader;
pub use plan::{plan_requests, LoadLimits, LoadRequest};
pub use tiled::{FeatureLoader, TILE_BATCH_SIZE};

use crate::api::ApiError;

/// Result of one load step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// At least one request succeeded and its pages were merged.
    Loaded { tiles: usize, features: usize },
    /// Every tile is exhausted or over budget; no request was made.
    NothingToLoad,
    /// A request failed; nothing from this step was merged.
    Failed(ApiError),
}

impl StepOutcome {
    /// Whether new data was fetched.
    pub fn fetched_any(&self) -> bool {
        matches!(self, StepOutcome::Loaded { .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StepOutcome::Failed(e) if e.is_rate_limited())
    }
}
