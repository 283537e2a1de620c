//! Engine configuration: default region, focus zoom and tile fetch tuning.

use crate::core::geo::GeoPoint;
use std::time::Duration;

/// Top-level engine configuration.
///
/// The default region is a single configurable value used by every render
/// path that has no points to frame, instead of per-call-site literals.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Center shown when there is nothing to frame.
    pub default_center: GeoPoint,
    /// Zoom used together with [`MapConfig::default_center`].
    pub default_zoom: u8,
    /// Close-in zoom for focusing a single listing.
    pub focus_zoom: u8,
    /// Tile fetch tuning.
    pub fetch: TileFetchConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: GeoPoint::new(45.7580, 21.2355),
            default_zoom: 15,
            focus_zoom: 17,
            fetch: TileFetchConfig::default(),
        }
    }
}

/// Tuning for the per-render tile fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFetchConfig {
    /// Maximum tile downloads in flight at once within one render.
    pub max_concurrent: usize,
    /// Per-attempt timeout; a timed-out tile degrades like any other failure.
    pub timeout: Duration,
    /// Total attempts per tile before it falls back to the error fill.
    pub max_attempts: usize,
    /// Delay between attempts.
    pub retry_delay: Duration,
}

impl Default for TileFetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl TileFetchConfig {
    /// Conservative settings for constrained connections.
    pub fn low_resource() -> Self {
        Self {
            max_concurrent: 2,
            timeout: Duration::from_secs(20),
            max_attempts: 1,
            retry_delay: Duration::from_millis(250),
        }
    }

    /// Fast-failing settings for tests with stub sources.
    pub fn for_testing() -> Self {
        Self {
            max_concurrent: 4,
            timeout: Duration::from_millis(500),
            max_attempts: 1,
            retry_delay: Duration::from_millis(10),
        }
    }
}
