//! Request and response bodies of the geometry endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cache::{PageCursor, PageToken};
use crate::coord::Tile;
use crate::feature::Feature;

/// Endpoint returning features for a batch of tiles.
pub const TILE_ENDPOINT: &str = "/geometry/tile";

/// Endpoint returning one page of the whole dataset.
pub const GLOBAL_ENDPOINT: &str = "/geometry/get";

/// Hard upper bound the server places on `pageSize`.
pub const SERVER_MAX_PAGE_SIZE: u32 = 3000;

/// Which geometry representation to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    /// Full geometry.
    Geometry,
    /// One representative point per feature.
    Center,
}

impl ReturnType {
    pub fn from_center_points(center_points: bool) -> Self {
        if center_points {
            ReturnType::Center
        } else {
            ReturnType::Geometry
        }
    }
}

/// Fields shared by every geometry request of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(rename = "mapId")]
    pub resource_id: String,
    pub layer_id: String,
    pub return_type: ReturnType,
    pub zip: bool,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
}

/// One tile and the page it should continue from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileParam {
    pub tile_id: Tile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_start: Option<PageToken>,
}

/// Body of a `/geometry/tile` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileBatchBody<'a> {
    #[serde(flatten)]
    pub params: &'a QueryParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_filter: Option<&'a Value>,
    pub tiles: Vec<TileParam>,
}

/// Body of a `/geometry/get` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPageBody<'a> {
    #[serde(flatten)]
    pub params: &'a QueryParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_start: Option<&'a PageToken>,
}

/// The `result` object wrapping a page of features.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeaturePage {
    pub features: Vec<Feature>,
}

/// One entry of a `/geometry/tile` response, aligned with the request tiles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilePage {
    /// Server-reported size of this page in bytes.
    #[serde(default, deserialize_with = "byte_size")]
    pub size: u64,
    pub result: FeaturePage,
    #[serde(default)]
    pub next_page_start: Option<Value>,
}

impl TilePage {
    pub fn cursor(&self) -> PageCursor {
        PageCursor::from_server(self.next_page_start.clone())
    }
}

/// Accept any JSON number for a byte size.
///
/// Floats are truncated and saturate at the `u64` range. Negative, non-finite
/// and non-numeric values count as zero.
fn byte_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let size = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(size) => size,
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map_or(0, |f| f as u64),
        },
        _ => 0,
    };
    Ok(size)
}

/// Response of a `/geometry/get` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPage {
    #[serde(default)]
    pub result: Option<FeaturePage>,
    #[serde(default)]
    pub next_page_start: Option<Value>,
}

impl GlobalPage {
    pub fn cursor(&self) -> PageCursor {
        PageCursor::from_server(self.next_page_start.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> QueryParams {
        QueryParams {
            resource_id: "block-1".to_string(),
            layer_id: "layer-1".to_string(),
            return_type: ReturnType::Center,
            zip: true,
            page_size: 25,
            style_id: None,
            style: None,
        }
    }

    #[test]
    fn test_tile_batch_body_shape() {
        let params = params();
        let filter = json!([{"key": "kind", "operator": "=", "value": "road"}]);
        let body = TileBatchBody {
            params: &params,
            property_filter: Some(&filter),
            tiles: vec![
                TileParam {
                    tile_id: Tile::new(10, 512, 340),
                    page_start: None,
                },
                TileParam {
                    tile_id: Tile::new(10, 513, 340),
                    page_start: Some(PageToken::new("X")),
                },
            ],
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "mapId": "block-1",
                "layerId": "layer-1",
                "returnType": "center",
                "zip": true,
                "pageSize": 25,
                "propertyFilter": filter,
                "tiles": [
                    {"tileId": {"zoom": 10, "tileX": 512, "tileY": 340}},
                    {"tileId": {"zoom": 10, "tileX": 513, "tileY": 340}, "pageStart": "X"}
                ]
            })
        );
    }

    #[test]
    fn test_global_body_includes_style() {
        let mut params = params();
        params.return_type = ReturnType::Geometry;
        params.style_id = Some("style-7".to_string());
        let token = PageToken::new(3000);
        let body = GlobalPageBody {
            params: &params,
            page_start: Some(&token),
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["returnType"], json!("geometry"));
        assert_eq!(value["styleId"], json!("style-7"));
        assert_eq!(value["pageStart"], json!(3000));
        assert!(value.get("style").is_none());
    }

    #[test]
    fn test_tile_page_parses() {
        let page: TilePage = serde_json::from_value(json!({
            "size": 2048,
            "result": {"type": "FeatureCollection", "features": [{"id": 1}, {"id": 2}]},
            "nextPageStart": "X"
        }))
        .unwrap();

        assert_eq!(page.size, 2048);
        assert_eq!(page.result.features.len(), 2);
        assert_eq!(page.cursor(), PageCursor::Next(PageToken::new("X")));
    }

    #[test]
    fn test_tile_page_accepts_float_size() {
        let page: TilePage = serde_json::from_value(json!({
            "size": 1523.0,
            "result": {"features": [{"id": 1}]},
            "nextPageStart": null
        }))
        .unwrap();

        assert_eq!(page.size, 1523);
        assert_eq!(page.result.features.len(), 1);
        assert!(page.cursor().is_exhausted());
    }

    #[test]
    fn test_tile_page_odd_sizes() {
        let size = |raw: Value| {
            serde_json::from_value::<TilePage>(json!({"size": raw, "result": {"features": []}}))
                .unwrap()
                .size
        };
        assert_eq!(size(json!(12.9)), 12);
        assert_eq!(size(json!(-4)), 0);
        assert_eq!(size(json!(-4.5)), 0);
        assert_eq!(size(json!(1e30)), u64::MAX);
        assert_eq!(size(json!(null)), 0);
        assert_eq!(size(json!("big")), 0);
    }

    #[test]
    fn test_tile_page_without_cursor_is_exhausted() {
        let page: TilePage =
            serde_json::from_value(json!({"size": 1, "result": {"features": []}})).unwrap();
        assert!(page.cursor().is_exhausted());
    }

    #[test]
    fn test_tile_page_rejects_missing_result() {
        let parsed = serde_json::from_value::<TilePage>(json!({"size": 1}));
        assert!(parsed.is_err());
    }
}
