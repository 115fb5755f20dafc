//! `config` command - print the effective configuration.

use std::path::Path;

use geolayer::config::ConfigFile;

use super::common::load_config;
use crate::error::CliError;

/// Run the config command.
pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let (config, path) = load_config(config_path)?;

    match &path {
        Some(path) if path.exists() => println!("# {}", path.display()),
        Some(path) => println!("# {} (not found, using defaults)", path.display()),
        None => println!("# no config directory, using defaults"),
    }
    println!();
    print!("{}", render(&config));

    Ok(())
}

fn render(config: &ConfigFile) -> String {
    let layer = &config.layer;
    let api = &config.api;
    let or_unset = |v: Option<String>| v.unwrap_or_else(|| "(not set)".to_string());

    let mut out = String::new();
    out.push_str("[layer]\n");
    out.push_str(&format!("  block_id = {}\n", layer.block_id));
    out.push_str(&format!("  layer_id = {}\n", layer.layer_id));
    out.push_str(&format!("  max_zoom = {}\n", layer.max_zoom));
    out.push_str(&format!(
        "  page_size = {} (sent: {})\n",
        layer.page_size,
        layer.effective_page_size()
    ));
    out.push_str(&format!(
        "  max_mb_per_tile = {}\n",
        layer.max_bytes_per_tile as f64 / 1_000_000.0
    ));
    out.push_str(&format!(
        "  max_tiles_in_cache = {}\n",
        layer.max_tiles_in_cache
    ));
    out.push_str(&format!(
        "  max_features_per_tile = {}\n",
        layer.max_features_per_tile
    ));
    out.push_str(&format!("  load_all = {}\n", layer.load_all));
    out.push_str(&format!("  center_points = {}\n", layer.center_points));
    out.push_str(&format!(
        "  filter = {}\n",
        or_unset(layer.filter.as_ref().map(|f| f.to_string()))
    ));
    out.push_str(&format!(
        "  style_id = {}\n",
        or_unset(layer.style_id.clone())
    ));
    out.push_str("\n[api]\n");
    out.push_str(&format!("  url = {}\n", api.url));
    out.push_str(&format!(
        "  token = {}\n",
        if api.token.is_some() { "(set)" } else { "(not set)" }
    ));
    out.push_str(&format!("  timeout_secs = {}\n", api.timeout_secs));
    out
}
