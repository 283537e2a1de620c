//! Screen-space hit index: click-to-marker resolution for one rendered frame.

use crate::core::bounds::Bounds;
use crate::core::geo::Point;
use crate::render::markers::Marker;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// One clamped hit box and the markers occupying it.
///
/// `slots` index into the owning frame's marker table, in insertion order
/// with duplicate marker ids suppressed.
#[derive(Debug, Clone)]
pub struct HitRegion {
    rect: Bounds,
    slots: Vec<usize>,
}

impl HitRegion {
    pub(crate) fn new(rect: Bounds, slots: Vec<usize>) -> Self {
        debug_assert!(rect.is_valid());
        Self { rect, slots }
    }

    pub fn rect(&self) -> &Bounds {
        &self.rect
    }
}

impl RTreeObject for HitRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.rect.min.x, self.rect.min.y],
            [self.rect.max.x, self.rect.max.y],
        )
    }
}

impl PointDistance for HitRegion {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let center = self.rect.center();
        let dx = center.x - point[0];
        let dy = center.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.rect.contains(&Point::new(point[0], point[1]))
    }
}

/// Immutable click-resolution index for one rendered frame.
///
/// Rebuilt wholesale on every render and swapped in atomically; it is never
/// mutated after publication, so answering a click against it needs no
/// synchronization with in-flight renders.
#[derive(Debug)]
pub struct HitIndex {
    tree: RTree<HitRegion>,
    markers: Vec<Marker>,
}

impl HitIndex {
    pub(crate) fn new(regions: Vec<HitRegion>, markers: Vec<Marker>) -> Self {
        Self {
            tree: RTree::bulk_load(regions),
            markers,
        }
    }

    /// An index with nothing to hit.
    pub fn empty() -> Self {
        Self {
            tree: RTree::new(),
            markers: Vec::new(),
        }
    }

    /// All markers whose hit region contains `click`, in the order the
    /// markers were drawn, duplicates removed by marker id.
    ///
    /// Zero, one and many results are all normal outcomes; disambiguating
    /// an ambiguous click belongs to the caller.
    pub fn hit_test(&self, click: Point) -> Vec<Marker> {
        let mut slots: Vec<usize> = self
            .tree
            .locate_all_at_point(&[click.x, click.y])
            .flat_map(|region| region.slots.iter().copied())
            .collect();
        // Slot order is draw order, which makes the union deterministic
        // even though the R-tree visits regions in arbitrary order.
        slots.sort_unstable();
        slots.dedup();

        let mut seen_ids = Vec::new();
        let mut matches = Vec::new();
        for slot in slots {
            let marker = self.markers[slot];
            if !seen_ids.contains(&marker.id) {
                seen_ids.push(marker.id);
                matches.push(marker);
            }
        }
        matches
    }

    /// Markers indexed by this frame, in draw order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn region_count(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for HitIndex {
    fn default() -> Self {
        Self::empty()
    }
}
