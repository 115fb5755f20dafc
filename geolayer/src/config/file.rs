//! INI configuration file loading.
//!
//! ```ini
//! [layer]
//! block_id = 0ec49fb8-...
//! layer_id = 6ffb4e1d-...
//! max_zoom = 18
//! page_size = 500
//! max_mb_per_tile = 16
//! filter = [{"key": "kind", "operator": "=", "value": "road"}]
//!
//! [api]
//! url = https://api.ellipsis-drive.com/v1
//! token = ...
//! timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use serde_json::Value;

use super::layer::LayerConfig;
use super::ConfigError;
use crate::api::{Credential, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

/// Directory name under the platform config dir.
const CONFIG_DIR_NAME: &str = "geolayer";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.ini";

/// Bytes per megabyte as used by `max_mb_per_tile`.
const BYTES_PER_MB: f64 = 1_000_000.0;

/// API connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiSettings {
    /// Bearer credential for the configured token, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Credential::bearer)
    }
}

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub layer: LayerConfig,
    pub api: ApiSettings,
}

impl ConfigFile {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Load the config at `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config file contents. Missing keys keep their defaults.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = ConfigFile::default();

        if let Some(section) = ini.section(Some("layer")) {
            apply_layer_section(&mut config.layer, section)?;
        }
        if let Some(section) = ini.section(Some("api")) {
            apply_api_section(&mut config.api, section)?;
        }

        Ok(config)
    }
}

/// Default config file location, e.g. `~/.config/geolayer/config.ini`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn apply_layer_section(layer: &mut LayerConfig, section: &Properties) -> Result<(), ConfigError> {
    if let Some(v) = section.get("block_id") {
        layer.block_id = v.trim().to_string();
    }
    if let Some(v) = section.get("layer_id") {
        layer.layer_id = v.trim().to_string();
    }
    if let Some(v) = parse_key(section, "max_zoom")? {
        layer.max_zoom = v;
    }
    if let Some(v) = parse_key(section, "page_size")? {
        layer.page_size = v;
    }
    if let Some(mb) = parse_key::<f64>(section, "max_mb_per_tile")? {
        if !mb.is_finite() || mb < 0.0 {
            return Err(invalid("max_mb_per_tile", &mb.to_string()));
        }
        layer.max_bytes_per_tile = (mb * BYTES_PER_MB) as u64;
    }
    if let Some(v) = parse_key(section, "max_tiles_in_cache")? {
        layer.max_tiles_in_cache = v;
    }
    if let Some(v) = parse_key(section, "max_features_per_tile")? {
        layer.max_features_per_tile = v;
    }
    if let Some(v) = parse_bool(section, "load_all")? {
        layer.load_all = v;
    }
    if let Some(v) = parse_bool(section, "center_points")? {
        layer.center_points = v;
    }
    if let Some(v) = parse_json(section, "filter")? {
        layer.filter = Some(v);
    }
    if let Some(v) = section.get("style_id") {
        let v = v.trim();
        layer.style_id = (!v.is_empty()).then(|| v.to_string());
    }
    if let Some(v) = parse_json(section, "style")? {
        layer.style = Some(v);
    }
    Ok(())
}

fn apply_api_section(api: &mut ApiSettings, section: &Properties) -> Result<(), ConfigError> {
    if let Some(v) = section.get("url") {
        api.url = v.trim().to_string();
    }
    if let Some(v) = section.get("token") {
        let v = v.trim();
        api.token = (!v.is_empty()).then(|| v.to_string());
    }
    if let Some(v) = parse_key(section, "timeout_secs")? {
        api.timeout_secs = v;
    }
    Ok(())
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_key<T: FromStr>(section: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, raw)),
    }
}

fn parse_bool(section: &Properties, key: &str) -> Result<Option<bool>, ConfigError> {
    match section.get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "true" | "yes" | "1" | "on" => Ok(Some(true)),
            "false" | "no" | "0" | "off" => Ok(Some(false)),
            _ => Err(invalid(key, &v)),
        },
    }
}

fn parse_json(section: &Properties, key: &str) -> Result<Option<Value>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => serde_json::from_str(raw.trim())
            .map(Some)
            .map_err(|_| invalid(key, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_full_file() {
        let config = ConfigFile::parse(
            r#"
[layer]
block_id = block-1
layer_id = layer-1
max_zoom = 18
page_size = 500
max_mb_per_tile = 2.5
max_tiles_in_cache = 100
max_features_per_tile = 50
load_all = yes
center_points = true
style_id = s-1

[api]
url = https://example.com/v1
token = abc
timeout_secs = 10
"#,
        )
        .unwrap();

        assert_eq!(config.layer.block_id, "block-1");
        assert_eq!(config.layer.layer_id, "layer-1");
        assert_eq!(config.layer.max_zoom, 18);
        assert_eq!(config.layer.page_size, 500);
        assert_eq!(config.layer.max_bytes_per_tile, 2_500_000);
        assert_eq!(config.layer.max_tiles_in_cache, 100);
        assert_eq!(config.layer.max_features_per_tile, 50);
        assert!(config.layer.load_all);
        assert!(config.layer.center_points);
        assert_eq!(config.layer.style_id.as_deref(), Some("s-1"));
        assert_eq!(config.api.url, "https://example.com/v1");
        assert_eq!(config.api.token.as_deref(), Some("abc"));
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_parse_empty_keeps_defaults() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.api.url, DEFAULT_API_URL);
    }

    #[test]
    fn test_parse_json_filter() {
        let config = ConfigFile::parse(
            "[layer]\nfilter = [{\"key\": \"kind\", \"operator\": \"=\", \"value\": \"road\"}]\n",
        )
        .unwrap();
        assert_eq!(
            config.layer.filter,
            Some(json!([{"key": "kind", "operator": "=", "value": "road"}]))
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = ConfigFile::parse("[layer]\nmax_zoom = lots\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "max_zoom"));
    }

    #[test]
    fn test_invalid_bool() {
        let err = ConfigFile::parse("[layer]\nload_all = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "load_all"));
    }

    #[test]
    fn test_negative_megabytes_rejected() {
        let err = ConfigFile::parse("[layer]\nmax_mb_per_tile = -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[layer]\nblock_id = b\nlayer_id = l").unwrap();

        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.layer.block_id, "b");
        assert!(config.layer.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ini");

        assert!(matches!(
            ConfigFile::load(&path),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(
            ConfigFile::load_or_default(&path).unwrap(),
            ConfigFile::default()
        );
    }

    #[test]
    fn test_credential_from_token() {
        let mut api = ApiSettings::default();
        assert!(api.credential().is_none());

        api.token = Some("  ".to_string());
        assert!(api.credential().is_none());

        api.token = Some("abc".to_string());
        assert_eq!(api.credential().unwrap().token, "abc");
    }

    #[test]
    fn test_default_config_path_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("geolayer/config.ini"));
        }
    }
}
