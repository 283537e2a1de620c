use crate::core::constants::TILE_SIZE;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mercator y diverges at the poles; clamping sin(lat) keeps the projection
/// finite for any input latitude.
const SIN_LAT_LIMIT: f64 = 0.9999;

/// Side length of the world-pixel square at the given zoom level.
pub fn world_pixel_size(zoom: u8) -> f64 {
    TILE_SIZE as f64 * 2_f64.powi(zoom as i32)
}

/// A geographical coordinate with latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Wraps longitude to the [-180, 180] range.
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }

    /// Projects to normalized Mercator space, x and y in [0, 1).
    ///
    /// Zoom independent; multiply by [`world_pixel_size`] to get world
    /// pixels at a concrete zoom.
    pub fn to_normalized(&self) -> Point {
        let x = (self.lng + 180.0) / 360.0;
        let sin_lat = (self.lat * PI / 180.0)
            .sin()
            .clamp(-SIN_LAT_LIMIT, SIN_LAT_LIMIT);
        let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);
        Point::new(x, y)
    }

    /// Inverse of [`GeoPoint::to_normalized`].
    pub fn from_normalized(norm: Point) -> Self {
        let lng = norm.x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * norm.y)).sinh().atan().to_degrees();
        Self::new(lat, lng)
    }

    /// Projects to world-pixel coordinates at the given zoom level.
    pub fn to_world_pixel(&self, zoom: u8) -> Point {
        self.to_normalized().multiply(world_pixel_size(zoom))
    }

    /// Unprojects a world pixel back to a geographical coordinate.
    pub fn from_world_pixel(pixel: Point, zoom: u8) -> Self {
        Self::from_normalized(pixel.multiply(1.0 / world_pixel_size(zoom)))
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A point in world-pixel or screen-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A tile index in the slippy-map grid.
///
/// `x` and `y` come straight out of floor division and may lie outside
/// `[0, 2^z)`: callers wrap `x` with [`TileCoord::wrapped_x`] (antimeridian
/// crossing) and skip tiles whose `y` fails [`TileCoord::y_in_range`]
/// (beyond the poles there are no tiles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Tile containing the given world pixel.
    pub fn from_world_pixel(pixel: Point, zoom: u8) -> Self {
        Self::new(
            (pixel.x / TILE_SIZE as f64).floor() as i64,
            (pixel.y / TILE_SIZE as f64).floor() as i64,
            zoom,
        )
    }

    /// Number of tiles per axis at this tile's zoom level.
    pub fn tiles_per_axis(&self) -> i64 {
        1_i64 << self.z
    }

    /// `x` wrapped into `[0, 2^z)`.
    pub fn wrapped_x(&self) -> u32 {
        self.x.rem_euclid(self.tiles_per_axis()) as u32
    }

    /// Whether `y` addresses an existing tile row.
    pub fn y_in_range(&self) -> bool {
        self.y >= 0 && self.y < self.tiles_per_axis()
    }

    /// World-pixel position of this tile's top-left corner (unwrapped).
    pub fn world_origin(&self) -> Point {
        Point::new(
            (self.x * TILE_SIZE as i64) as f64,
            (self.y * TILE_SIZE as i64) as f64,
        )
    }
}
