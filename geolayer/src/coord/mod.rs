//! Tile grid mapping.
//!
//! Converts a geographic viewport into the set of Web Mercator slippy tiles
//! that cover it, plus a one-tile prefetch margin on every side.

mod types;

pub use types::{
    Bounds, Tile, TileKey, TileRange, Viewport, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};

use std::f64::consts::PI;

/// Number of tiles added on every side of the visible rectangle.
pub const TILE_MARGIN: i64 = 1;

/// Highest zoom level the grid mapper accepts. Larger values are clamped.
pub const MAX_GRID_ZOOM: u8 = 30;

/// Computes the clipped, margin-expanded tile rectangle covering `bounds`.
///
/// Returns `None` only when the bounds are inverted so far that no tile
/// survives clipping.
pub fn tile_range(bounds: &Bounds, zoom: u8) -> Option<TileRange> {
    let zoom = zoom.min(MAX_GRID_ZOOM);
    let b = bounds.clamped();

    let n = 2.0_f64.powi(zoom as i32);
    let last = (1_i64 << zoom) - 1;

    let x_min = lon_to_col(b.x_min, n);
    let x_max = lon_to_col(b.x_max, n);
    // Rows grow southward, so the northern edge gives the smallest row.
    let y_min = lat_to_row(b.y_max, n);
    let y_max = lat_to_row(b.y_min, n);

    let x_lo = x_min.saturating_sub(TILE_MARGIN).max(0);
    let x_hi = x_max.saturating_add(TILE_MARGIN).min(last);
    let y_lo = y_min.saturating_sub(TILE_MARGIN).max(0);
    let y_hi = y_max.saturating_add(TILE_MARGIN).min(last);

    if x_lo > x_hi || y_lo > y_hi {
        return None;
    }

    Some(TileRange {
        zoom,
        x_min: x_lo as u32,
        x_max: x_hi as u32,
        y_min: y_lo as u32,
        y_max: y_hi as u32,
    })
}

/// Returns every tile covering `bounds` at `zoom`, including the margin.
///
/// The result is a fresh set: callers replace their current tile set with it
/// rather than diffing.
pub fn tiles_for_viewport(bounds: &Bounds, zoom: u8) -> Vec<Tile> {
    match tile_range(bounds, zoom) {
        Some(range) => range.tiles().collect(),
        None => Vec::new(),
    }
}

/// Geographic extent of a tile.
pub fn tile_bounds(tile: &Tile) -> Bounds {
    let n = 2.0_f64.powi(tile.zoom as i32);
    let west = tile.tile_x as f64 / n * 360.0 - 180.0;
    let east = (tile.tile_x + 1) as f64 / n * 360.0 - 180.0;
    let north = row_to_lat(tile.tile_y as f64, n);
    let south = row_to_lat((tile.tile_y + 1) as f64, n);
    Bounds::new(west, south, east, north)
}

#[inline]
fn lon_to_col(lon: f64, n: f64) -> i64 {
    ((lon + 180.0) * (n / 360.0)).floor() as i64
}

#[inline]
fn lat_to_row(lat: f64, n: f64) -> i64 {
    ((n / (2.0 * PI)) * (PI - (PI / 4.0 + lat / 360.0 * PI).tan().ln())).floor() as i64
}

#[inline]
fn row_to_lat(row: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / n)).sinh().atan() * 180.0 / PI
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(bounds: &Bounds) -> (f64, f64) {
        (
            (bounds.x_min + bounds.x_max) / 2.0,
            (bounds.y_min + bounds.y_max) / 2.0,
        )
    }

    #[test]
    fn test_zoom_zero_yields_single_tile() {
        let tiles = tiles_for_viewport(&Bounds::new(-10.0, -10.0, 10.0, 10.0), 0);
        assert_eq!(tiles, vec![Tile::new(0, 0, 0)]);
    }

    #[test]
    fn test_world_at_zoom_two_covers_grid() {
        let tiles = tiles_for_viewport(&Bounds::world(), 2);
        assert_eq!(tiles.len(), 16);
    }

    #[test]
    fn test_out_of_range_bounds_are_clamped() {
        let tiles = tiles_for_viewport(&Bounds::new(-500.0, -95.0, 500.0, 95.0), 3);
        assert_eq!(tiles.len(), 64);
        assert!(tiles.iter().all(|t| t.tile_x < 8 && t.tile_y < 8));
    }

    #[test]
    fn test_degenerate_viewport_yields_neighbourhood() {
        let target = Tile::new(10, 512, 340);
        let (lon, lat) = center(&tile_bounds(&target));

        let tiles = tiles_for_viewport(&Bounds::new(lon, lat, lon, lat), 10);

        assert_eq!(tiles.len(), 9);
        assert!(tiles.contains(&target));
        assert!(tiles.contains(&Tile::new(10, 511, 339)));
        assert!(tiles.contains(&Tile::new(10, 513, 341)));
    }

    #[test]
    fn test_corner_viewport_is_clipped() {
        let corner = Tile::new(5, 0, 0);
        let (lon, lat) = center(&tile_bounds(&corner));

        let range = tile_range(&Bounds::new(lon, lat, lon, lat), 5).unwrap();

        assert_eq!((range.x_min, range.x_max), (0, 1));
        assert_eq!((range.y_min, range.y_max), (0, 1));
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_rows_increase_southward() {
        let north = tile_range(&Bounds::new(0.0, 60.0, 0.0, 60.0), 8).unwrap();
        let south = tile_range(&Bounds::new(0.0, -60.0, 0.0, -60.0), 8).unwrap();
        assert!(north.y_min < south.y_min);
    }

    #[test]
    fn test_inverted_bounds_yield_nothing() {
        let tiles = tiles_for_viewport(&Bounds::new(170.0, 0.0, -170.0, 1.0), 6);
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_tile_bounds_round_trip() {
        let tile = Tile::new(12, 2100, 1360);
        let (lon, lat) = center(&tile_bounds(&tile));
        let range = tile_range(&Bounds::new(lon, lat, lon, lat), 12).unwrap();
        assert_eq!(range.x_min + 1, tile.tile_x);
        assert_eq!(range.y_min + 1, tile.tile_y);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// Brute-force membership check over the whole grid.
        fn reference_tiles(bounds: &Bounds, zoom: u8) -> Vec<Tile> {
            let b = bounds.clamped();
            let n = 2.0_f64.powi(zoom as i32);
            let x_min = lon_to_col(b.x_min, n);
            let x_max = lon_to_col(b.x_max, n);
            let y_min = lat_to_row(b.y_max, n);
            let y_max = lat_to_row(b.y_min, n);

            let mut out = Vec::new();
            for x in 0..(1_i64 << zoom) {
                for y in 0..(1_i64 << zoom) {
                    let in_x = x >= x_min - 1 && x <= x_max + 1;
                    let in_y = y >= y_min - 1 && y <= y_max + 1;
                    if in_x && in_y {
                        out.push(Tile::new(zoom, x as u32, y as u32));
                    }
                }
            }
            out
        }

        proptest! {
            #[test]
            fn test_tiles_within_grid(
                lon_a in -200.0..200.0_f64,
                lon_b in -200.0..200.0_f64,
                lat_a in -90.0..90.0_f64,
                lat_b in -90.0..90.0_f64,
                zoom in 0u8..=16
            ) {
                let bounds = Bounds::new(lon_a.min(lon_b), lat_a.min(lat_b), lon_a.max(lon_b), lat_a.max(lat_b));
                let max = 1u32 << zoom;
                if let Some(range) = tile_range(&bounds, zoom) {
                    prop_assert!(range.x_min <= range.x_max && range.x_max < max);
                    prop_assert!(range.y_min <= range.y_max && range.y_max < max);
                    prop_assert_eq!(range.zoom, zoom);
                }
            }

            #[test]
            fn test_matches_brute_force(
                lon_a in -180.0..180.0_f64,
                lon_b in -180.0..180.0_f64,
                lat_a in -85.0..85.0_f64,
                lat_b in -85.0..85.0_f64,
                zoom in 0u8..=6
            ) {
                let bounds = Bounds::new(lon_a.min(lon_b), lat_a.min(lat_b), lon_a.max(lon_b), lat_a.max(lat_b));
                let mut actual = tiles_for_viewport(&bounds, zoom);
                let mut expected = reference_tiles(&bounds, zoom);
                actual.sort_by_key(|t| (t.tile_x, t.tile_y));
                expected.sort_by_key(|t| (t.tile_x, t.tile_y));
                prop_assert_eq!(actual, expected);
            }

            #[test]
            fn test_never_empty_for_ordered_bounds(
                lon in -180.0..180.0_f64,
                lat in -85.0..85.0_f64,
                zoom in 0u8..=18
            ) {
                let bounds = Bounds::new(lon, lat, lon, lat);
                let range = tile_range(&bounds, zoom);
                prop_assert!(range.is_some());
                prop_assert!(range.unwrap().len() >= 1);
            }
        }
    }
}
