//! Tile compositing: turns a viewport into a stitched raster plus hit index.

use crate::core::config::TileFetchConfig;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::TileCoord;
use crate::core::viewport::Viewport;
use crate::hit::HitIndex;
use crate::render::markers::{self, Marker};
use crate::tiles::source::{TileError, TileSource};
use crate::{MapError, Result};
use futures::{stream, StreamExt};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Background behind tiles that were skipped (no tile row beyond the poles).
const BACKGROUND: Rgba<u8> = Rgba([211, 211, 211, 255]); // light gray

/// Fill for tiles whose fetch or decode failed.
const FAILED_TILE: Rgba<u8> = Rgba([128, 128, 128, 255]); // gray

/// One grid cell scheduled for fetching. `coord` carries the wrapped x the
/// source is asked for; the draw offset keeps the unwrapped position so
/// antimeridian-crossing viewports stitch correctly.
struct TileJob {
    coord: TileCoord,
    draw_x: i64,
    draw_y: i64,
}

/// Stitches remote tiles and a marker overlay into one raster per render.
///
/// Tile fetches run as a bounded-concurrency fan-out; any subset of them may
/// fail independently, and each failure degrades only its own 256x256 cell.
pub struct Compositor {
    source: Arc<dyn TileSource>,
    fetch: TileFetchConfig,
}

impl Compositor {
    pub fn new(source: Arc<dyn TileSource>, fetch: TileFetchConfig) -> Self {
        Self { source, fetch }
    }

    /// Renders `viewport` with `markers` drawn on top.
    ///
    /// Returns the raster together with the frame's hit index. The only
    /// whole-render failure is a viewport without pixel area; individual
    /// tile failures are painted over with [`FAILED_TILE`].
    pub async fn render(
        &self,
        viewport: &Viewport,
        markers: &[Marker],
    ) -> Result<(RgbaImage, HitIndex)> {
        if !viewport.has_area() {
            return Err(MapError::InvalidViewport(format!(
                "viewport is {}x{} pixels",
                viewport.width, viewport.height
            )));
        }

        let mut raster = RgbaImage::from_pixel(viewport.width, viewport.height, BACKGROUND);
        let top_left = viewport.top_left_world();
        let jobs = self.visible_tiles(viewport);
        let tile_count = jobs.len();

        let mut fetches = stream::iter(jobs.into_iter().map(|job| {
            let coord = job.coord;
            async move { (job, self.fetch_tile(coord).await) }
        }))
        .buffered(self.fetch.max_concurrent.max(1));

        let mut failed = 0_usize;
        while let Some((job, outcome)) = fetches.next().await {
            match outcome.and_then(decode_tile) {
                Ok(tile) => blit(&mut raster, &tile, job.draw_x, job.draw_y),
                Err(err) => {
                    log::warn!("tile {:?} degraded to fallback fill: {}", job.coord, err);
                    fill_rect(
                        &mut raster,
                        job.draw_x,
                        job.draw_y,
                        TILE_SIZE,
                        TILE_SIZE,
                        FAILED_TILE,
                    );
                    failed += 1;
                }
            }
        }

        let hit_index = markers::draw_markers(&mut raster, markers, top_left, viewport.zoom);

        log::info!(
            "composited {}x{} raster at z{}: {} tiles ({} failed), {} markers indexed",
            viewport.width,
            viewport.height,
            viewport.zoom,
            tile_count,
            failed,
            hit_index.markers().len()
        );

        Ok((raster, hit_index))
    }

    /// Inclusive row-major tile range covering the viewport. X wraps around
    /// the antimeridian; rows outside `[0, 2^z)` have no tiles and are left
    /// as background.
    fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileJob> {
        let top_left = viewport.top_left_world();
        let tile = TILE_SIZE as f64;

        let first_x = (top_left.x / tile).floor() as i64;
        let first_y = (top_left.y / tile).floor() as i64;
        let last_x = ((top_left.x + viewport.width as f64) / tile).floor() as i64;
        let last_y = ((top_left.y + viewport.height as f64) / tile).floor() as i64;

        let mut jobs = Vec::new();
        for ty in first_y..=last_y {
            for tx in first_x..=last_x {
                let grid = TileCoord::new(tx, ty, viewport.zoom);
                if !grid.y_in_range() {
                    continue;
                }
                let origin = grid.world_origin();
                jobs.push(TileJob {
                    coord: TileCoord::new(grid.wrapped_x() as i64, ty, viewport.zoom),
                    draw_x: (origin.x - top_left.x).round() as i64,
                    draw_y: (origin.y - top_left.y).round() as i64,
                });
            }
        }
        jobs
    }

    /// Fetches one tile with a per-attempt timeout and bounded retries.
    async fn fetch_tile(&self, coord: TileCoord) -> std::result::Result<Vec<u8>, TileError> {
        let attempts = self.fetch.max_attempts.max(1);
        let mut last_error = TileError::Timeout(coord);

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.fetch.timeout, self.source.fetch(coord)).await {
                Ok(Ok(bytes)) => return Ok(bytes),
                Ok(Err(err)) => {
                    log::debug!("tile {:?} failed on attempt {}: {}", coord, attempt, err);
                    last_error = err;
                }
                Err(_) => {
                    log::debug!("tile {:?} timed out on attempt {}", coord, attempt);
                    last_error = TileError::Timeout(coord);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.fetch.retry_delay).await;
            }
        }
        Err(last_error)
    }
}

/// Decodes tile bytes, normalizing to the 256x256 grid cell.
fn decode_tile(bytes: Vec<u8>) -> std::result::Result<RgbaImage, TileError> {
    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    if decoded.width() == TILE_SIZE && decoded.height() == TILE_SIZE {
        Ok(decoded)
    } else {
        Ok(image::imageops::resize(
            &decoded,
            TILE_SIZE,
            TILE_SIZE,
            FilterType::Triangle,
        ))
    }
}

/// Copies `src` into `dst` at (dx, dy), clipping to the destination.
fn blit(dst: &mut RgbaImage, src: &RgbaImage, dx: i64, dy: i64) {
    let dst_w = dst.width() as i64;
    let dst_h = dst.height() as i64;

    for sy in 0..src.height() as i64 {
        let ty = dy + sy;
        if ty < 0 || ty >= dst_h {
            continue;
        }
        for sx in 0..src.width() as i64 {
            let tx = dx + sx;
            if tx < 0 || tx >= dst_w {
                continue;
            }
            dst.put_pixel(
                tx as u32,
                ty as u32,
                *src.get_pixel(sx as u32, sy as u32),
            );
        }
    }
}

/// Fills a rectangle with a flat color, clipping to the destination.
fn fill_rect(dst: &mut RgbaImage, dx: i64, dy: i64, width: u32, height: u32, color: Rgba<u8>) {
    let dst_w = dst.width() as i64;
    let dst_h = dst.height() as i64;

    for sy in 0..height as i64 {
        let ty = dy + sy;
        if ty < 0 || ty >= dst_h {
            continue;
        }
        for sx in 0..width as i64 {
            let tx = dx + sx;
            if tx < 0 || tx >= dst_w {
                continue;
            }
            dst.put_pixel(tx as u32, ty as u32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::GeoPoint;

    struct NeverSource;

    #[async_trait::async_trait]
    impl TileSource for NeverSource {
        async fn fetch(&self, coord: TileCoord) -> std::result::Result<Vec<u8>, TileError> {
            Err(TileError::Timeout(coord))
        }
    }

    fn compositor() -> Compositor {
        Compositor::new(Arc::new(NeverSource), TileFetchConfig::for_testing())
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let viewport = Viewport::new(GeoPoint::new(45.7580, 21.2355), 15, 600, 400);
        let jobs = compositor().visible_tiles(&viewport);

        // 600px needs 3..4 tile columns, 400px needs 2..3 rows.
        assert!(jobs.len() >= 6 && jobs.len() <= 12, "got {}", jobs.len());
        for job in &jobs {
            assert!(job.coord.x >= 0 && job.coord.x < 1 << 15);
            assert!(job.coord.y >= 0 && job.coord.y < 1 << 15);
            assert!(job.draw_x > -(TILE_SIZE as i64) && job.draw_x <= 600);
            assert!(job.draw_y > -(TILE_SIZE as i64) && job.draw_y <= 400);
        }
    }

    #[test]
    fn test_antimeridian_tiles_wrap() {
        let viewport = Viewport::new(GeoPoint::new(0.0, 179.99), 4, 600, 200);
        let jobs = compositor().visible_tiles(&viewport);

        assert!(!jobs.is_empty());
        // Every requested x is wrapped into the grid even though the
        // viewport spans the date line.
        for job in &jobs {
            assert!(job.coord.x >= 0 && job.coord.x < 16);
        }
        // Some cells must come from the far side of the wrap.
        assert!(jobs.iter().any(|j| j.coord.x == 0));
        assert!(jobs.iter().any(|j| j.coord.x == 15));
    }

    #[test]
    fn test_polar_rows_are_skipped() {
        // Zoom 0 world is one tile; a tall viewport hangs over both poles.
        let viewport = Viewport::new(GeoPoint::new(0.0, 0.0), 0, 256, 1000);
        let jobs = compositor().visible_tiles(&viewport);
        assert!(jobs.iter().all(|j| j.coord.y == 0));
    }

    #[test]
    fn test_zero_area_viewport_is_rejected() {
        let viewport = Viewport::new(GeoPoint::default(), 3, 0, 400);
        let result = futures::executor::block_on(compositor().render(&viewport, &[]));
        assert!(matches!(result, Err(MapError::InvalidViewport(_))));
    }

    #[test]
    fn test_blit_clips_to_destination() {
        let mut dst = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));

        blit(&mut dst, &src, -2, -2);
        blit(&mut dst, &src, 8, 8);

        assert_eq!(*dst.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(9, 9), Rgba([255, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(7, 7), Rgba([0, 0, 0, 255]));
    }
}
