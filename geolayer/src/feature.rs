//! GeoJSON feature records as returned by the geometry API.
//!
//! Features are kept opaque: the loader counts and stores them, and the
//! render host receives them unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One geometry + properties record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(Value);

impl Feature {
    /// Wrap a raw JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The GeoJSON geometry type, if the record carries one.
    pub fn geometry_type(&self) -> Option<&str> {
        self.0.get("geometry")?.get("type")?.as_str()
    }

    /// The `properties` object, if present.
    pub fn properties(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.get("properties")?.as_object()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Feature {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Replace-all payload pushed to the render host.
///
/// Serialises as a GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    kind: String,
    pub features: Vec<Feature>,
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
