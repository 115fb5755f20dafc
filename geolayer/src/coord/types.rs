//! Tile, bounds and viewport types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longitude limits used when clamping viewport bounds.
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Latitude limits used when clamping viewport bounds.
///
/// Slightly inside the Web Mercator limit of ±85.0511° so that the row
/// formula never reaches infinity.
pub const MIN_LAT: f64 = -85.0;
pub const MAX_LAT: f64 = 85.0;

/// One cell of the slippy-tile grid at a given zoom level.
///
/// Serialises with the field names the geometry API expects
/// (`zoom`, `tileX`, `tileY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Zoom level
    pub zoom: u8,
    /// Column, increasing eastward
    pub tile_x: u32,
    /// Row, increasing southward
    pub tile_y: u32,
}

impl Tile {
    /// Create a new tile.
    pub fn new(zoom: u8, tile_x: u32, tile_y: u32) -> Self {
        Self {
            zoom,
            tile_x,
            tile_y,
        }
    }

    /// Cache identity of this tile.
    pub fn key(&self) -> TileKey {
        TileKey(format!("{}_{}_{}", self.zoom, self.tile_x, self.tile_y))
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.tile_x, self.tile_y)
    }
}

/// String identity of a tile, formatted as `"{zoom}_{tileX}_{tileY}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(String);

impl TileKey {
    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Tile> for TileKey {
    fn from(tile: &Tile) -> Self {
        tile.key()
    }
}

/// Geographic rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Create bounds from west, south, east and north edges.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// The whole mappable world.
    pub fn world() -> Self {
        Self::new(MIN_LON, MIN_LAT, MAX_LON, MAX_LAT)
    }

    /// Clamp longitudes to [-180, 180] and latitudes to [-85, 85].
    pub fn clamped(&self) -> Self {
        Self {
            x_min: self.x_min.clamp(MIN_LON, MAX_LON),
            x_max: self.x_max.clamp(MIN_LON, MAX_LON),
            y_min: self.y_min.clamp(MIN_LAT, MAX_LAT),
            y_max: self.y_max.clamp(MIN_LAT, MAX_LAT),
        }
    }
}

/// The rectangle currently visible on the render host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: Bounds,
    /// Zoom level expressed on the 256px tile pyramid.
    pub zoom: f64,
}

impl Viewport {
    pub fn new(bounds: Bounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }
}

/// Inclusive rectangle of tile indices at a single zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// Number of tiles in the range.
    pub fn len(&self) -> usize {
        let cols = (self.x_max - self.x_min + 1) as usize;
        let rows = (self.y_max - self.y_min + 1) as usize;
        cols.saturating_mul(rows)
    }

    /// A range always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the tile lies inside this range.
    pub fn contains(&self, tile: &Tile) -> bool {
        tile.zoom == self.zoom
            && (self.x_min..=self.x_max).contains(&tile.tile_x)
            && (self.y_min..=self.y_max).contains(&tile.tile_y)
    }

    /// Iterate the tiles column by column.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (self.x_min..=self.x_max).flat_map(move |x| {
            (self.y_min..=self.y_max).map(move |y| Tile::new(self.zoom, x, y))
        })
    }
}
