//! Layer configuration.
//!
//! [`LayerConfig`] is the in-memory options object for one layer. It can be
//! built in code with the `with_*` setters or read from an INI file through
//! [`ConfigFile`].

mod file;
mod layer;

pub use file::{default_config_path, ApiSettings, ConfigFile};
pub use layer::{
    LayerConfig, DEFAULT_MAX_BYTES_PER_TILE, DEFAULT_MAX_FEATURES_PER_TILE,
    DEFAULT_MAX_TILES_IN_CACHE, DEFAULT_MAX_ZOOM, DEFAULT_PAGE_SIZE,
};

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid INI.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A key holds a value of the wrong type or range.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// The options as a whole are unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
