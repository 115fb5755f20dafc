//! Layer options.

use serde_json::Value;

use super::ConfigError;
use crate::api::{QueryParams, ReturnType, SERVER_MAX_PAGE_SIZE};
use crate::coord::MAX_GRID_ZOOM;
use crate::loader::LoadLimits;

// ==================== Defaults ====================

/// Default maximum tile zoom level requested from the server.
pub const DEFAULT_MAX_ZOOM: u8 = 21;

/// Default number of features requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Default per-tile byte budget (16 MB).
pub const DEFAULT_MAX_BYTES_PER_TILE: u64 = 16_000_000;

/// Default number of tiles kept in the feature cache.
pub const DEFAULT_MAX_TILES_IN_CACHE: usize = 500;

/// Default per-tile feature budget.
pub const DEFAULT_MAX_FEATURES_PER_TILE: usize = 200;

/// Options of one vector layer.
///
/// `block_id` and `layer_id` identify the remote resource; the remaining
/// fields bound how much is loaded and how it is requested.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    /// Remote resource (map) identifier.
    pub block_id: String,
    /// Layer within the resource.
    pub layer_id: String,
    /// Highest tile zoom level requested.
    pub max_zoom: u8,
    /// Features per page; capped at [`SERVER_MAX_PAGE_SIZE`] when sent.
    pub page_size: u32,
    /// Stop paging a tile once it holds more than this many bytes.
    pub max_bytes_per_tile: u64,
    /// Entry count above which cache eviction runs.
    pub max_tiles_in_cache: usize,
    /// Stop paging a tile once it holds more than this many features.
    pub max_features_per_tile: usize,
    /// Walk the whole dataset instead of loading per tile.
    pub load_all: bool,
    /// Request one representative point per feature instead of geometry.
    pub center_points: bool,
    /// Server-side property filter, passed through unchanged.
    pub filter: Option<Value>,
    /// Server-side style to apply.
    pub style_id: Option<String>,
    /// Inline style definition, passed through unchanged.
    pub style: Option<Value>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            block_id: String::new(),
            layer_id: String::new(),
            max_zoom: DEFAULT_MAX_ZOOM,
            page_size: DEFAULT_PAGE_SIZE,
            max_bytes_per_tile: DEFAULT_MAX_BYTES_PER_TILE,
            max_tiles_in_cache: DEFAULT_MAX_TILES_IN_CACHE,
            max_features_per_tile: DEFAULT_MAX_FEATURES_PER_TILE,
            load_all: false,
            center_points: false,
            filter: None,
            style_id: None,
            style: None,
        }
    }
}

impl LayerConfig {
    /// Create a config for the given resource and layer with default limits.
    pub fn new(block_id: impl Into<String>, layer_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            layer_id: layer_id.into(),
            ..Self::default()
        }
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_bytes_per_tile(mut self, bytes: u64) -> Self {
        self.max_bytes_per_tile = bytes;
        self
    }

    pub fn with_max_tiles_in_cache(mut self, tiles: usize) -> Self {
        self.max_tiles_in_cache = tiles;
        self
    }

    pub fn with_max_features_per_tile(mut self, features: usize) -> Self {
        self.max_features_per_tile = features;
        self
    }

    pub fn with_load_all(mut self, load_all: bool) -> Self {
        self.load_all = load_all;
        self
    }

    pub fn with_center_points(mut self, center_points: bool) -> Self {
        self.center_points = center_points;
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_style_id(mut self, style_id: impl Into<String>) -> Self {
        self.style_id = Some(style_id.into());
        self
    }

    /// Page size actually sent to the server.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.min(SERVER_MAX_PAGE_SIZE)
    }

    /// Per-tile limits used by the loader.
    pub fn limits(&self) -> LoadLimits {
        LoadLimits {
            max_features_per_tile: self.max_features_per_tile,
            max_bytes_per_tile: self.max_bytes_per_tile,
        }
    }

    /// Request fields shared by every geometry call of this layer.
    pub fn query_params(&self) -> QueryParams {
        QueryParams {
            resource_id: self.block_id.clone(),
            layer_id: self.layer_id.clone(),
            return_type: ReturnType::from_center_points(self.center_points),
            zip: true,
            page_size: self.effective_page_size(),
            style_id: self.style_id.clone(),
            style: self.style.clone(),
        }
    }

    /// Check that the options describe a loadable layer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_id.trim().is_empty() {
            return Err(ConfigError::Invalid("block_id must not be empty".to_string()));
        }
        if self.layer_id.trim().is_empty() {
            return Err(ConfigError::Invalid("layer_id must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "page_size".to_string(),
                value: "0".to_string(),
            });
        }
        if self.max_zoom > MAX_GRID_ZOOM {
            return Err(ConfigError::InvalidValue {
                key: "max_zoom".to_string(),
                value: self.max_zoom.to_string(),
            });
        }
        Ok(())
    }
}
