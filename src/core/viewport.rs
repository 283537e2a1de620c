use crate::core::constants::MAX_ZOOM;
use crate::core::geo::{GeoPoint, Point};
use serde::{Deserialize, Serialize};

/// One view of the map: geographic center, integer zoom and pixel size.
///
/// Viewports are transient values owned by the caller; the compositor
/// consumes one per render and never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the view in geographical coordinates.
    pub center: GeoPoint,
    /// Tile zoom level, clamped to `[0, MAX_ZOOM]` on construction.
    pub zoom: u8,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

impl Viewport {
    /// The center longitude is wrapped into `[-180, 180]` and the zoom
    /// clamped, so any caller-supplied view is renderable.
    pub fn new(center: GeoPoint, zoom: u8, width: u32, height: u32) -> Self {
        Self {
            center: GeoPoint::new(center.lat, GeoPoint::wrap_lng(center.lng)),
            zoom: zoom.min(MAX_ZOOM),
            width,
            height,
        }
    }

    /// World-pixel position of the raster's top-left corner.
    pub fn top_left_world(&self) -> Point {
        let center_pixel = self.center.to_world_pixel(self.zoom);
        center_pixel.subtract(&Point::new(
            self.width as f64 / 2.0,
            self.height as f64 / 2.0,
        ))
    }

    /// Converts a geographical coordinate to raster-pixel coordinates,
    /// (0,0) being the raster's top-left corner.
    pub fn geo_to_screen(&self, point: &GeoPoint) -> Point {
        point
            .to_world_pixel(self.zoom)
            .subtract(&self.top_left_world())
    }

    /// Converts a raster-pixel coordinate back to a geographical one.
    /// Inverse of [`Viewport::geo_to_screen`]; this is the click-to-geo path.
    pub fn screen_to_geo(&self, pixel: &Point) -> GeoPoint {
        GeoPoint::from_world_pixel(self.top_left_world().add(pixel), self.zoom)
    }

    /// A raster can only be produced for a non-empty pixel area.
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(GeoPoint::default(), 0, 800, 600)
    }
}
