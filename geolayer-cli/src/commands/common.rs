//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use geolayer::config::{default_config_path, ConfigFile};
use geolayer::controller::target_zoom;
use geolayer::coord::{tile_range, Bounds};

use crate::error::CliError;

/// Load the config file from `--config` or the default location.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<(ConfigFile, Option<PathBuf>), CliError> {
    match path {
        Some(path) => Ok((ConfigFile::load(path)?, Some(path.to_path_buf()))),
        None => match default_config_path() {
            Some(path) => Ok((ConfigFile::load_or_default(&path)?, Some(path))),
            None => Ok((ConfigFile::default(), None)),
        },
    }
}

/// Parse `xmin,ymin,xmax,ymax` in degrees.
pub fn parse_bbox(raw: &str) -> Result<Bounds, CliError> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| CliError::Argument(format!("bbox '{}' is not four numbers", raw)))?;

    match parts.as_slice() {
        [x_min, y_min, x_max, y_max] if x_min <= x_max && y_min <= y_max => {
            Ok(Bounds::new(*x_min, *y_min, *x_max, *y_max))
        }
        [_, _, _, _] => Err(CliError::Argument(format!(
            "bbox '{}' must be ordered xmin,ymin,xmax,ymax",
            raw
        ))),
        _ => Err(CliError::Argument(format!(
            "bbox '{}' must have exactly four values",
            raw
        ))),
    }
}

/// Largest tile set a single `fetch` will poll for.
pub const MAX_FETCH_TILES: usize = 10_000;

/// Reject viewports whose tile set at the load zoom exceeds [`MAX_FETCH_TILES`].
///
/// Returns the number of tiles otherwise.
pub fn check_tile_count(bounds: &Bounds, host_zoom: f64, max_zoom: u8) -> Result<usize, CliError> {
    let zoom = target_zoom(host_zoom, max_zoom);
    let count = tile_range(bounds, zoom).map_or(0, |range| range.len());
    if count > MAX_FETCH_TILES {
        return Err(CliError::Argument(format!(
            "bbox covers {} tiles at zoom {} (limit {}); use a smaller bbox or a lower --zoom",
            count, zoom, MAX_FETCH_TILES
        )));
    }
    Ok(count)
}
