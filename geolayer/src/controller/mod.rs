//! Viewport-driven polling.
//!
//! [`ViewportController`] owns one layer's cache and loaders. Viewport
//! changes recompute the visible tile set and (re)start polling; each poll
//! tick runs at most one load step and pushes the merged features to a
//! [`RenderHost`].
//!
//! # Example
//!
//! ```ignore
//! use geolayer::controller::ViewportController;
//!
//! let controller = ViewportController::new(config, client, host);
//! let handle = controller.start();
//! handle.update_viewport(viewport);
//!
//! // Later
//! handle.stop();
//! let controller = handle.join().await?;
//! ```

mod handle;
mod viewport;

pub use handle::ControllerHandle;
pub use viewport::{target_zoom, ControllerState, ViewportController};

use std::time::Duration;

use crate::api::ApiError;
use crate::feature::FeatureCollection;

/// Zoom levels subtracted from the host zoom before tiling.
pub const ZOOM_LOAD_AHEAD: f64 = 2.0;

/// Period of the polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The rendering surface features are pushed to.
pub trait RenderHost: Send {
    /// Replace everything shown for this layer.
    fn set_data(&mut self, data: FeatureCollection);

    /// Called when a load step was rejected with HTTP 429.
    ///
    /// Loading keeps retrying at the normal cadence regardless.
    fn on_rate_limited(&mut self, _error: &ApiError) {}

    /// Called when a load step failed for any other reason.
    ///
    /// The step is retried on the next tick.
    fn on_load_failed(&mut self, _error: &ApiError) {}
}
