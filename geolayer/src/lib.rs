//! GeoLayer - viewport-driven vector feature loading
//!
//! This library loads vector features from a remote geometry API for
//! whatever part of the map is currently visible. The viewport is mapped to
//! slippy tiles, each tile is paged in incrementally and cached, and the
//! merged features of the visible tiles are pushed to a render host.
//!
//! # Modules
//!
//! - [`coord`] - viewport to tile grid mapping
//! - [`cache`] - per-tile feature cache with cohort eviction
//! - [`loader`] - batched load steps against the API
//! - [`controller`] - the polling loop tying it together
//! - [`api`] - API client trait, reqwest client and wire types
//! - [`config`] - layer options and INI config files

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod coord;
pub mod feature;
pub mod loader;
pub mod logging;

pub use controller::{ControllerHandle, RenderHost, ViewportController};
pub use feature::{Feature, FeatureCollection};
