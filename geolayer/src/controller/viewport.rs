//! The per-layer polling state machine.

use std::ops::{Deref, DerefMut};

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ControllerHandle, RenderHost, POLL_INTERVAL, ZOOM_LOAD_AHEAD};
use crate::api::{ApiClient, Credential};
use crate::cache::FeatureCache;
use crate::config::LayerConfig;
use crate::coord::{tiles_for_viewport, Tile, Viewport};
use crate::feature::FeatureCollection;
use crate::loader::{FeatureLoader, GlobalLoader, StepOutcome};

/// Whether the polling loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Polling,
}

/// Tile zoom used for a host zoom: `host_zoom - ZOOM_LOAD_AHEAD`, truncated
/// and clamped to `[0, max_zoom]`.
pub fn target_zoom(host_zoom: f64, max_zoom: u8) -> u8 {
    if host_zoom.is_nan() {
        return 0;
    }
    (host_zoom - ZOOM_LOAD_AHEAD)
        .min(f64::from(max_zoom))
        .max(0.0)
        .floor() as u8
}

/// Drives loading for one layer instance.
pub struct ViewportController<C, H> {
    config: LayerConfig,
    client: C,
    host: H,
    cache: FeatureCache,
    loader: FeatureLoader,
    global: Option<GlobalLoader>,
    tiles: Vec<Tile>,
    zoom: Option<u8>,
    state: ControllerState,
    is_loading: bool,
    view_dirty: bool,
}

impl<C: ApiClient, H: RenderHost> ViewportController<C, H> {
    /// Create an idle controller. Nothing is requested until the first
    /// viewport update.
    pub fn new(config: LayerConfig, client: C, host: H) -> Self {
        let loader = FeatureLoader::new(config.query_params(), config.limits())
            .with_filter(config.filter.clone());
        let global = config
            .load_all
            .then(|| GlobalLoader::new(config.query_params()));

        Self {
            config,
            client,
            host,
            cache: FeatureCache::new(),
            loader,
            global,
            tiles: Vec::new(),
            zoom: None,
            state: ControllerState::Idle,
            is_loading: false,
            view_dirty: false,
        }
    }

    /// Attach the credential sent with every request.
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.loader = self.loader.with_credential(credential.clone());
        self.global = self.global.map(|global| global.with_credential(credential));
        self
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The current tile set, empty before the first viewport update.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile zoom of the current tile set.
    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.state == ControllerState::Polling
    }

    /// Features loaded in load-all mode, if enabled.
    pub fn global_loader(&self) -> Option<&GlobalLoader> {
        self.global.as_ref()
    }

    /// Replace the tile set for a new viewport and start polling.
    ///
    /// In load-all mode only the first update matters; it starts the walk.
    pub fn handle_viewport_update(&mut self, viewport: Viewport) {
        if let Some(global) = &self.global {
            if self.zoom.is_none() && !global.is_complete() {
                self.zoom = Some(0);
                info!("Starting load-all walk");
                self.start_polling();
            }
            return;
        }

        let zoom = target_zoom(viewport.zoom, self.config.max_zoom);
        self.tiles = tiles_for_viewport(&viewport.bounds, zoom);
        self.zoom = Some(zoom);
        self.view_dirty = true;

        debug!(zoom, tiles = self.tiles.len(), "Viewport changed");
        self.start_polling();
    }

    fn start_polling(&mut self) {
        if self.state == ControllerState::Idle {
            debug!("Polling started");
            self.state = ControllerState::Polling;
        }
    }

    fn stop_polling(&mut self) {
        if self.state == ControllerState::Polling {
            debug!("Polling stopped, nothing left to load");
            self.state = ControllerState::Idle;
        }
    }

    /// Run one poll tick.
    ///
    /// Returns `None` without doing anything when idle or when a step is
    /// already in flight. Otherwise evicts, runs one load step, refreshes the
    /// view on progress and stops polling once nothing is left to load.
    /// A failed step leaves polling on so it is retried on the next tick.
    pub async fn tick(&mut self) -> Option<StepOutcome> {
        if self.is_loading || self.state == ControllerState::Idle {
            return None;
        }

        let outcome = {
            let mut in_flight = InFlight::enter(self);
            in_flight.step().await
        };

        match &outcome {
            StepOutcome::Loaded { .. } => self.update_view(),
            StepOutcome::NothingToLoad => {
                if self.view_dirty {
                    self.update_view();
                }
                self.stop_polling();
            }
            StepOutcome::Failed(error) => {
                if error.is_rate_limited() {
                    warn!(error = %error, "Rate limited by geometry API");
                    self.host.on_rate_limited(error);
                } else {
                    debug!(error = %error, "Load step failed, retrying on next tick");
                    self.host.on_load_failed(error);
                }
            }
        }

        Some(outcome)
    }

    async fn step(&mut self) -> StepOutcome {
        if let Some(global) = self.global.as_mut() {
            return global.try_load_step(&self.client).await;
        }

        self.cache
            .evict_if_over_capacity(self.config.max_tiles_in_cache);
        self.loader
            .try_load_step(&self.tiles, &mut self.cache, &self.client)
            .await
    }

    /// Push the features of the current tile set to the host, replacing
    /// whatever it showed before.
    pub fn update_view(&mut self) {
        let collection = match &self.global {
            Some(global) => global.features().iter().cloned().collect(),
            None => {
                if self.tiles.is_empty() {
                    return;
                }
                FeatureCollection::new(self.cache.features_for(&self.tiles))
            }
        };

        debug!(features = collection.len(), "Updating view");
        self.host.set_data(collection);
        self.view_dirty = false;
    }

    /// The polling loop.
    ///
    /// Viewport events are only read between ticks, so a step in flight is
    /// never interrupted by a viewport change. Returns the controller when
    /// `shutdown` fires, or once the event channel has closed and nothing is
    /// left to load.
    pub async fn run(
        mut self,
        mut viewport_rx: mpsc::UnboundedReceiver<Viewport>,
        shutdown: CancellationToken,
    ) -> Self {
        let mut ticker = interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut events_open = true;

        info!(
            block_id = %self.config.block_id,
            layer_id = %self.config.layer_id,
            load_all = self.config.load_all,
            "Viewport controller starting"
        );

        loop {
            if !events_open && !self.is_polling() {
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Viewport controller shutting down");
                    break;
                }

                event = viewport_rx.recv(), if events_open => match event {
                    Some(viewport) => self.handle_viewport_update(viewport),
                    None => events_open = false,
                },

                _ = ticker.tick(), if self.is_polling() => {
                    self.tick().await;
                }
            }
        }

        self.state = ControllerState::Idle;
        info!(stats = %self.cache.stats(), "Viewport controller stopped");
        self
    }
}

/// Marks a step as in flight for as long as it lives.
///
/// Dropping the guard clears `is_loading`, including when a `tick` future is
/// dropped mid-step.
struct InFlight<'a, C, H> {
    controller: &'a mut ViewportController<C, H>,
}

impl<'a, C, H> InFlight<'a, C, H> {
    fn enter(controller: &'a mut ViewportController<C, H>) -> Self {
        controller.is_loading = true;
        Self { controller }
    }
}

impl<C, H> Deref for InFlight<'_, C, H> {
    type Target = ViewportController<C, H>;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl<C, H> DerefMut for InFlight<'_, C, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl<C, H> Drop for InFlight<'_, C, H> {
    fn drop(&mut self) {
        self.controller.is_loading = false;
    }
}

impl<C, H> ViewportController<C, H>
where
    C: ApiClient + 'static,
    H: RenderHost + 'static,
{
    /// Spawn the polling loop on the current tokio runtime.
    pub fn start(self) -> ControllerHandle<C, H> {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(rx, shutdown.clone()));
        ControllerHandle::new(tx, shutdown, task)
    }
}
