//! End-to-end engine tests over stub tile sources: compositing resilience,
//! marker hit-testing and frame publication, no network required.

use async_trait::async_trait;
use estatemap::{
    GeoPoint, ListingMap, MapConfig, Marker, MarkerStyle, Point, TileCoord, TileError, TileSource,
    TileFetchConfig,
};
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

const FAILED_TILE: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Always fails; every tile must degrade to the fallback fill.
struct FailingSource;

#[async_trait]
impl TileSource for FailingSource {
    async fn fetch(&self, coord: TileCoord) -> Result<Vec<u8>, TileError> {
        Err(TileError::Timeout(coord))
    }
}

/// Serves a solid-color PNG for every tile.
struct SolidSource {
    color: [u8; 4],
}

#[async_trait]
impl TileSource for SolidSource {
    async fn fetch(&self, _coord: TileCoord) -> Result<Vec<u8>, TileError> {
        let tile = RgbaImage::from_pixel(256, 256, Rgba(self.color));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(tile)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .expect("encoding a stub tile cannot fail");
        Ok(buf.into_inner())
    }
}

fn test_config() -> MapConfig {
    MapConfig {
        fetch: TileFetchConfig::for_testing(),
        ..MapConfig::default()
    }
}

fn failing_map() -> ListingMap {
    ListingMap::new(Arc::new(FailingSource), test_config())
}

fn solid_map(color: [u8; 4]) -> ListingMap {
    ListingMap::new(Arc::new(SolidSource { color }), test_config())
}

#[tokio::test]
async fn render_survives_total_tile_failure() {
    let map = failing_map();
    let output = map
        .render_at(GeoPoint::new(45.7580, 21.2355), 15, &[], 600, 400)
        .await
        .expect("render must not abort on tile failures");

    assert_eq!(output.raster.width(), 600);
    assert_eq!(output.raster.height(), 400);
    // Far from the poles every cell has a tile row, so the whole raster
    // is the fallback fill.
    assert!(output.raster.pixels().all(|p| *p == FAILED_TILE));
}

#[tokio::test]
async fn solid_tiles_stitch_seamlessly() {
    let map = solid_map([10, 120, 200, 255]);
    let output = map
        .render_at(GeoPoint::new(45.7580, 21.2355), 15, &[], 600, 400)
        .await
        .unwrap();

    assert!(output
        .raster
        .pixels()
        .all(|p| *p == Rgba([10, 120, 200, 255])));
}

#[tokio::test]
async fn focused_marker_is_drawn_and_clickable() {
    let map = solid_map([240, 240, 240, 255]);
    let home = Marker::new(
        42,
        GeoPoint::new(45.7580, 21.2355),
        MarkerStyle::RentableAvailable,
    );

    let output = map.render_focused(&home, 600, 400).await.unwrap();
    assert_eq!(output.frame.viewport.zoom, 17);

    // The marker sits on the center pixel, painted with the green fill.
    assert_eq!(
        *output.raster.get_pixel(300, 200),
        Rgba([50, 205, 50, 255])
    );

    let hits = map.hit_test(Point::new(300.0, 200.0));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 42);

    assert!(map.hit_test(Point::new(10.0, 10.0)).is_empty());
}

#[tokio::test]
async fn overlapping_markers_are_both_reported_in_order() {
    let map = solid_map([240, 240, 240, 255]);
    let center = GeoPoint::new(45.7580, 21.2355);
    // ~9px to the east at zoom 17; the 20px hit boxes overlap.
    let neighbor = GeoPoint::new(45.7580, 21.2356);
    let markers = [
        Marker::new(1, center, MarkerStyle::RentableAvailable),
        Marker::new(2, neighbor, MarkerStyle::RentableRented),
    ];

    map.render_at(center, 17, &markers, 600, 400).await.unwrap();

    let hits = map.hit_test(Point::new(304.0, 200.0));
    assert_eq!(hits.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn disjoint_markers_resolve_uniquely() {
    let map = solid_map([240, 240, 240, 255]);
    let center = GeoPoint::new(45.7580, 21.2355);
    // ~100px away at zoom 17; boxes cannot overlap.
    let distant = GeoPoint::new(45.7580, 21.2366);
    let markers = [
        Marker::new(1, center, MarkerStyle::RentableAvailable),
        Marker::new(2, distant, MarkerStyle::NotRentable),
    ];

    map.render_at(center, 17, &markers, 600, 400).await.unwrap();

    let hits = map.hit_test(Point::new(300.0, 200.0));
    assert_eq!(hits.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn center_click_inverts_to_center_point() {
    let map = solid_map([0, 0, 0, 255]);
    let center = GeoPoint::new(45.7580, 21.2355);
    map.render_at(center, 15, &[], 600, 400).await.unwrap();

    let picked = map.click_to_geo(Point::new(300.0, 200.0)).unwrap();
    assert!((picked.lat - center.lat).abs() < 1e-6);
    assert!((picked.lng - center.lng).abs() < 1e-6);
}

#[tokio::test]
async fn framed_render_centers_on_bbox_midpoint() {
    let map = failing_map();
    let markers = [
        Marker::new(1, GeoPoint::new(45.7580, 21.2355), MarkerStyle::RentableAvailable),
        Marker::new(2, GeoPoint::new(45.7600, 21.2400), MarkerStyle::RentableRented),
    ];

    let framed = map.render_framed(&markers, 600, 400).await.unwrap();
    let lone = map
        .render_framed(&markers[..1], 600, 400)
        .await
        .unwrap();

    // Fitting a pair never zooms past fitting either point alone.
    assert!(framed.frame.viewport.zoom <= lone.frame.viewport.zoom);
    // Longitude center is the bbox midpoint (linear axis).
    assert!((framed.frame.viewport.center.lng - 21.23775).abs() < 1e-9);
}

#[tokio::test]
async fn sequential_renders_publish_newest_frame() {
    let map = solid_map([0, 0, 0, 255]);
    let first = map
        .render_at(GeoPoint::new(45.0, 21.0), 10, &[], 300, 300)
        .await
        .unwrap();
    let second = map
        .render_at(GeoPoint::new(46.0, 22.0), 11, &[], 300, 300)
        .await
        .unwrap();

    assert!(second.frame.generation > first.frame.generation);
    let current = map.current_frame().unwrap();
    assert_eq!(current.generation, second.frame.generation);
    assert_eq!(current.viewport.zoom, 11);
}

#[tokio::test]
async fn default_region_render_uses_config() {
    let map = failing_map();
    let output = map.render_default(&[], 600, 400).await.unwrap();
    assert_eq!(output.frame.viewport.zoom, 15);
    assert!((output.frame.viewport.center.lat - 45.7580).abs() < 1e-9);
}
