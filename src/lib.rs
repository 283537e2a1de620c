//! # estatemap
//!
//! Raster map engine for real-estate listing browsers.
//!
//! The engine turns a geographic center/zoom/viewport into a stitched
//! raster assembled from remote map tiles, frames arbitrary listing sets
//! with a best-fit viewport, overlays styled markers, and resolves pixel
//! clicks back to the listing(s) under them. Listing storage, dialogs and
//! any other UI live outside the engine; they talk to it through
//! [`ListingMap`] and the `(position, style)` marker boundary.

pub mod core;
pub mod hit;
pub mod map;
pub mod render;
pub mod tiles;

pub use crate::core::{
    bounds::Bounds,
    config::{MapConfig, TileFetchConfig},
    constants,
    fit::fit_points,
    geo::{GeoPoint, Point, TileCoord},
    viewport::Viewport,
};
pub use crate::hit::{HitIndex, HitRegion};
pub use crate::map::{Frame, ListingMap, RenderOutput};
pub use crate::render::{Compositor, Marker, MarkerStyle};
pub use crate::tiles::{OpenStreetMapSource, TileError, TileSource};

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, MapError>;

/// Engine-level errors.
///
/// Per-tile failures never surface here; the compositor recovers them
/// locally with a fallback fill.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A tile could not be produced. Only returned by [`TileSource`]
    /// implementations themselves, never by a render.
    #[error("tile fetch failed: {0}")]
    Tile(#[from] TileError),

    /// The viewport fitter was handed an empty point set.
    #[error("cannot fit a viewport to an empty point set")]
    DegenerateInput,

    /// The render target has no pixel area.
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),
}
