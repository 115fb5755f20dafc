//! `fetch` command - drive one controller headlessly for a bounding box.

use std::path::PathBuf;

use geolayer::api::{ApiError, Credential, ReqwestApiClient};
use geolayer::controller::{ViewportController, POLL_INTERVAL};
use geolayer::coord::Viewport;
use geolayer::{FeatureCollection, RenderHost};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::common::{check_tile_count, load_config, parse_bbox};
use crate::error::CliError;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub block: Option<String>,
    pub layer: Option<String>,
    pub bbox: String,
    pub zoom: f64,
    pub token: Option<String>,
    pub config: Option<PathBuf>,
    pub load_all: bool,
    pub max_steps: Option<usize>,
    pub output: Option<PathBuf>,
}

/// Keeps the most recent collection pushed by the controller.
#[derive(Default)]
struct LatestView {
    latest: FeatureCollection,
    updates: usize,
    rate_limited: usize,
    failures: usize,
    status_reported: bool,
}

impl RenderHost for LatestView {
    fn set_data(&mut self, data: FeatureCollection) {
        self.latest = data;
        self.updates += 1;
    }

    fn on_rate_limited(&mut self, error: &ApiError) {
        self.rate_limited += 1;
        warn!(error = %error, "Rate limited, will retry");
    }

    fn on_load_failed(&mut self, error: &ApiError) {
        self.failures += 1;
        // A 401 or 404 never clears, so only the first one is worth a warning.
        if let ApiError::Status { status, .. } = error {
            if !self.status_reported {
                self.status_reported = true;
                warn!(
                    status = *status,
                    error = %error,
                    "Geometry API rejected the request, retrying until stopped (Ctrl-C or --max-steps)"
                );
            }
        }
    }
}

/// Run the fetch command.
pub async fn run(args: FetchArgs) -> Result<(), CliError> {
    let (file, _) = load_config(args.config.as_deref())?;
    let mut layer = file.layer;
    if let Some(block) = args.block {
        layer.block_id = block;
    }
    if let Some(id) = args.layer {
        layer.layer_id = id;
    }
    if args.load_all {
        layer.load_all = true;
    }
    layer.validate()?;

    let credential = args
        .token
        .map(Credential::bearer)
        .or_else(|| file.api.credential());
    let client = ReqwestApiClient::with_options(file.api.url.clone(), file.api.timeout_secs)?;
    let bounds = parse_bbox(&args.bbox)?;
    if !layer.load_all {
        check_tile_count(&bounds, args.zoom, layer.max_zoom)?;
    }
    let viewport = Viewport::new(bounds, args.zoom);

    info!(
        block_id = %layer.block_id,
        layer_id = %layer.layer_id,
        url = %file.api.url,
        "Fetching features"
    );

    let controller = ViewportController::new(layer, client, LatestView::default())
        .with_credential(credential);

    let (controller, steps) = match args.max_steps {
        Some(max_steps) => drive(controller, viewport, max_steps).await,
        None => {
            let handle = controller.start();
            let shutdown = handle.shutdown_token();
            if let Err(e) = ctrlc::set_handler(move || shutdown.cancel()) {
                warn!(error = %e, "Could not install Ctrl-C handler");
            }
            handle.update_viewport(viewport);
            let controller = handle
                .finish()
                .await
                .map_err(|e| CliError::Task(e.to_string()))?;
            (controller, None)
        }
    };

    let view = controller.host();
    println!("Zoom:        {}", controller.zoom().unwrap_or_default());
    println!("Tiles:       {}", controller.tiles().len());
    println!("Features:    {}", view.latest.len());
    println!("Updates:     {}", view.updates);
    if let Some(steps) = steps {
        println!("Steps:       {}", steps);
    }
    if view.rate_limited > 0 {
        println!("Rate limits: {}", view.rate_limited);
    }
    if view.failures > 0 {
        println!("Failures:    {}", view.failures);
    }
    println!("Cache:       {}", controller.cache().stats());
    if controller.is_polling() {
        println!("(stopped with data still pending)");
    }

    if let Some(path) = args.output {
        let json = serde_json::to_string(&view.latest).map_err(|e| CliError::Output(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| CliError::Output(format!("{}: {}", path.display(), e)))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Tick the controller in place, at the normal cadence, for at most
/// `max_steps` steps.
async fn drive<C, H>(
    mut controller: ViewportController<C, H>,
    viewport: Viewport,
    max_steps: usize,
) -> (ViewportController<C, H>, Option<usize>)
where
    C: geolayer::api::ApiClient,
    H: RenderHost,
{
    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    controller.handle_viewport_update(viewport);
    let mut steps = 0;
    while steps < max_steps && controller.is_polling() {
        ticker.tick().await;
        if controller.tick().await.is_some() {
            steps += 1;
        }
    }
    (controller, Some(steps))
}
