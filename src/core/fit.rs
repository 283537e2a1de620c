//! Viewport fitting: choose the (center, zoom) that frames a point set.

use crate::core::constants::{
    MAX_ZOOM, MIN_FIT_SPAN, MIN_ZOOM, TIGHT_CLUSTER_SPAN, TIGHT_CLUSTER_ZOOM_BOOST, TILE_SIZE,
};
use crate::core::geo::{GeoPoint, Point};
use crate::core::viewport::Viewport;
use crate::{MapError, Result};

/// Computes the viewport that frames all `points` in a `width` x `height`
/// raster with minimal margin.
///
/// Works in normalized Mercator space so the bounding box is zoom
/// independent; the chosen zoom is the floor of the more restrictive axis,
/// which guarantees the whole span fits. A single point (or a cluster whose
/// span is below [`TIGHT_CLUSTER_SPAN`] on both axes) gets a closer zoom so
/// one listing does not render as an empty continent-scale map.
///
/// An empty point set is a caller bug and is reported as
/// [`MapError::DegenerateInput`].
pub fn fit_points(points: &[GeoPoint], width: u32, height: u32) -> Result<Viewport> {
    if points.is_empty() {
        return Err(MapError::DegenerateInput);
    }

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for point in points {
        let norm = point.to_normalized();
        min_x = min_x.min(norm.x);
        max_x = max_x.max(norm.x);
        min_y = min_y.min(norm.y);
        max_y = max_y.max(norm.y);
    }

    let span_x = (max_x - min_x).max(MIN_FIT_SPAN);
    let span_y = (max_y - min_y).max(MIN_FIT_SPAN);

    let zoom_x = (width as f64 / (TILE_SIZE as f64 * span_x)).log2();
    let zoom_y = (height as f64 / (TILE_SIZE as f64 * span_y)).log2();

    let continuous = zoom_x.min(zoom_y);
    let mut zoom = if continuous.is_nan() || continuous.is_infinite() {
        MAX_ZOOM
    } else {
        continuous.floor().clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
    };

    if max_x - min_x < TIGHT_CLUSTER_SPAN && max_y - min_y < TIGHT_CLUSTER_SPAN {
        zoom = (zoom + TIGHT_CLUSTER_ZOOM_BOOST).min(MAX_ZOOM);
    }

    let center = GeoPoint::from_normalized(Point::new(
        (min_x + max_x) / 2.0,
        (min_y + max_y) / 2.0,
    ));

    Ok(Viewport::new(center, zoom, width, height))
}
