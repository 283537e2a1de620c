//! Listing map orchestrator: render triggers and frame publication.

use crate::core::config::MapConfig;
use crate::core::fit::fit_points;
use crate::core::geo::{GeoPoint, Point};
use crate::core::viewport::Viewport;
use crate::hit::HitIndex;
use crate::render::compositor::Compositor;
use crate::render::markers::Marker;
use crate::tiles::source::{OpenStreetMapSource, TileSource};
use crate::Result;
use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// The published result of one completed render: the viewport it was drawn
/// with and the hit index built over it. Immutable once published.
#[derive(Debug)]
pub struct Frame {
    pub generation: u64,
    pub viewport: Viewport,
    pub hit_index: HitIndex,
}

/// What a render call hands back to the caller.
pub struct RenderOutput {
    /// The stitched raster; pixel (0,0) is the viewport's top-left corner.
    pub raster: RgbaImage,
    /// The frame snapshot that was (possibly) published.
    pub frame: Arc<Frame>,
}

/// Map engine for listing browsers.
///
/// Owns the compositor and the single current frame. Renders may overlap in
/// time; each one draws into its own raster, and only the newest completed
/// frame is published ("latest render wins"). Clicks are always answered
/// against the most recently completed frame, never a partial one.
pub struct ListingMap {
    compositor: Compositor,
    config: MapConfig,
    generation: AtomicU64,
    current: Mutex<Option<Arc<Frame>>>,
}

impl ListingMap {
    pub fn new(source: Arc<dyn TileSource>, config: MapConfig) -> Self {
        let compositor = Compositor::new(source, config.fetch.clone());
        Self {
            compositor,
            config,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Engine over the public OpenStreetMap tile servers.
    pub fn with_openstreetmap(config: MapConfig) -> Self {
        Self::new(Arc::new(OpenStreetMapSource::new()), config)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Renders the configured default region; used when there is nothing
    /// to frame.
    pub async fn render_default(
        &self,
        markers: &[Marker],
        width: u32,
        height: u32,
    ) -> Result<RenderOutput> {
        self.render_at(
            self.config.default_center,
            self.config.default_zoom,
            markers,
            width,
            height,
        )
        .await
    }

    /// Renders the viewport that frames all `markers` with minimal margin.
    ///
    /// An empty marker set is a caller bug
    /// ([`crate::MapError::DegenerateInput`]); callers with nothing to show
    /// use [`ListingMap::render_default`] instead.
    pub async fn render_framed(
        &self,
        markers: &[Marker],
        width: u32,
        height: u32,
    ) -> Result<RenderOutput> {
        let points: Vec<GeoPoint> = markers.iter().map(|m| m.position).collect();
        let viewport = fit_points(&points, width, height)?;
        self.render_viewport(viewport, markers).await
    }

    /// Renders one listing close up, at the configured focus zoom.
    pub async fn render_focused(
        &self,
        marker: &Marker,
        width: u32,
        height: u32,
    ) -> Result<RenderOutput> {
        self.render_at(
            marker.position,
            self.config.focus_zoom,
            std::slice::from_ref(marker),
            width,
            height,
        )
        .await
    }

    /// Renders an explicit center and zoom.
    pub async fn render_at(
        &self,
        center: GeoPoint,
        zoom: u8,
        markers: &[Marker],
        width: u32,
        height: u32,
    ) -> Result<RenderOutput> {
        self.render_viewport(Viewport::new(center, zoom, width, height), markers)
            .await
    }

    async fn render_viewport(
        &self,
        viewport: Viewport,
        markers: &[Marker],
    ) -> Result<RenderOutput> {
        // Stamp before the first await so overlapping renders order by
        // start time; a superseded render's frame is discarded on publish.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (raster, hit_index) = self.compositor.render(&viewport, markers).await?;
        let frame = Arc::new(Frame {
            generation,
            viewport,
            hit_index,
        });
        self.publish(Arc::clone(&frame));

        Ok(RenderOutput { raster, frame })
    }

    /// Installs `frame` as the current one unless a newer render already
    /// published. The swap is atomic from the point of view of `hit_test`.
    ///
    /// The slot holds a plain `Option`, so a panic while the lock was held
    /// cannot leave it half-written; poisoning is recovered rather than
    /// wedging publication.
    fn publish(&self, frame: Arc<Frame>) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let stale = current
            .as_ref()
            .is_some_and(|installed| installed.generation >= frame.generation);
        if stale {
            log::debug!(
                "discarding stale frame {} (current is newer)",
                frame.generation
            );
        } else {
            *current = Some(frame);
        }
    }

    /// The most recently completed frame, if any render has finished.
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Resolves a raster-pixel click against the latest completed frame.
    /// Empty when nothing was hit or nothing has rendered yet.
    pub fn hit_test(&self, click: Point) -> Vec<Marker> {
        match self.current_frame() {
            Some(frame) => frame.hit_index.hit_test(click),
            None => Vec::new(),
        }
    }

    /// Inverse projection of a raster-pixel click through the latest
    /// completed frame's viewport; the location-picker path.
    pub fn click_to_geo(&self, click: Point) -> Option<GeoPoint> {
        self.current_frame()
            .map(|frame| frame.viewport.screen_to_geo(&click))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markers::MarkerStyle;

    fn frame(generation: u64) -> Arc<Frame> {
        Arc::new(Frame {
            generation,
            viewport: Viewport::default(),
            hit_index: HitIndex::empty(),
        })
    }

    fn map() -> ListingMap {
        ListingMap::with_openstreetmap(MapConfig::default())
    }

    #[test]
    fn test_latest_frame_wins() {
        let map = map();
        map.publish(frame(2));
        map.publish(frame(1)); // stale, must be discarded
        assert_eq!(map.current_frame().unwrap().generation, 2);

        map.publish(frame(3));
        assert_eq!(map.current_frame().unwrap().generation, 3);
    }

    #[test]
    fn test_publication_survives_lock_poisoning() {
        let map = Arc::new(map());

        let poisoner = Arc::clone(&map);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.current.lock().unwrap();
            panic!("poison the frame lock");
        })
        .join();

        map.publish(frame(1));
        assert_eq!(map.current_frame().unwrap().generation, 1);
    }

    #[test]
    fn test_no_frame_before_first_render() {
        let map = map();
        assert!(map.current_frame().is_none());
        assert!(map.hit_test(Point::new(10.0, 10.0)).is_empty());
        assert!(map.click_to_geo(Point::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_framed_render_rejects_empty_set() {
        let map = map();
        let result = futures::executor::block_on(map.render_framed(&[], 600, 400));
        assert!(matches!(result, Err(crate::MapError::DegenerateInput)));
    }

    #[test]
    fn test_focused_render_uses_focus_zoom() {
        let config = MapConfig::default();
        let marker = Marker::new(
            1,
            GeoPoint::new(45.7580, 21.2355),
            MarkerStyle::RentableAvailable,
        );
        // The viewport math is pure; verify without fetching tiles.
        let viewport = Viewport::new(marker.position, config.focus_zoom, 600, 400);
        assert_eq!(viewport.zoom, 17);
        assert_eq!(viewport.center, marker.position);
    }
}
