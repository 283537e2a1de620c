//! Engine-wide constants for the tile grid, zoom range and marker geometry.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Square tile edge in pixels (slippy-map convention).
pub const TILE_SIZE: u32 = 256;

/// Lowest zoom level (whole world in one tile).
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level the engine will request tiles for.
pub const MAX_ZOOM: u8 = 19;

/// Marker glyph radius in pixels.
pub const MARKER_RADIUS: i32 = 8;

/// Offset of the marker drop shadow, down and to the right.
pub const MARKER_SHADOW_OFFSET: i32 = 2;

/// Width of the darker ring around the marker fill.
pub const MARKER_BORDER_WIDTH: i32 = 2;

/// Edge of the square hit box centered on a marker.
pub const MARKER_HIT_SIZE: i32 = 20;

/// Floor applied to bounding-box spans before the zoom-fit division.
pub const MIN_FIT_SPAN: f64 = 1e-9;

/// Below this normalized span on both axes a point set is treated as a
/// single location and gets a closer zoom.
pub const TIGHT_CLUSTER_SPAN: f64 = 1e-6;

/// Extra zoom applied to tight clusters, still clamped to [`MAX_ZOOM`].
pub const TIGHT_CLUSTER_ZOOM_BOOST: u8 = 2;
