//! Marker overlay: glyph drawing plus hit-index construction.

use crate::core::bounds::Bounds;
use crate::core::constants::{
    MARKER_BORDER_WIDTH, MARKER_HIT_SIZE, MARKER_RADIUS, MARKER_SHADOW_OFFSET,
};
use crate::core::geo::{GeoPoint, Point};
use crate::hit::{HitIndex, HitRegion};
use fxhash::FxHashMap;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Semi-transparent black for the drop shadow.
const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 100]);

/// Visual style of a listing marker.
///
/// Derived at the boundary from the listing's rentable capability and
/// rented flag; the engine never inspects listing business fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerStyle {
    /// Rentable and currently free (green).
    RentableAvailable,
    /// Rentable but taken (gray).
    RentableRented,
    /// Not offered for rent at all (blue).
    NotRentable,
}

impl MarkerStyle {
    /// Maps a listing's rentable capability and rented flag to a style.
    pub fn for_listing(rentable_capable: bool, rented: bool) -> Self {
        if !rentable_capable {
            Self::NotRentable
        } else if rented {
            Self::RentableRented
        } else {
            Self::RentableAvailable
        }
    }

    fn fill(&self) -> Rgba<u8> {
        match self {
            Self::RentableAvailable => Rgba([50, 205, 50, 255]),  // lime green
            Self::RentableRented => Rgba([128, 128, 128, 255]),   // gray
            Self::NotRentable => Rgba([30, 144, 255, 255]),       // dodger blue
        }
    }

    fn border(&self) -> Rgba<u8> {
        match self {
            Self::RentableAvailable => Rgba([0, 100, 0, 255]),    // dark green
            Self::RentableRented => Rgba([47, 79, 79, 255]),      // dark slate gray
            Self::NotRentable => Rgba([0, 0, 128, 255]),          // navy
        }
    }
}

/// A listing marker: caller-supplied identity, position and style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Identity used for duplicate suppression and hit results,
    /// typically the listing id.
    pub id: u64,
    pub position: GeoPoint,
    pub style: MarkerStyle,
}

impl Marker {
    pub fn new(id: u64, position: GeoPoint, style: MarkerStyle) -> Self {
        Self {
            id,
            position,
            style,
        }
    }
}

/// Draws all markers onto `raster` and builds the frame's hit index.
///
/// Markers with out-of-range coordinates are skipped; markers whose hit box
/// misses the raster entirely are culled. Hit boxes are clamped to the
/// raster and grouped by exact clamped rectangle, with duplicate marker ids
/// suppressed within a rectangle.
pub fn draw_markers(
    raster: &mut RgbaImage,
    markers: &[Marker],
    top_left: Point,
    zoom: u8,
) -> HitIndex {
    let raster_bounds = Bounds::from_coords(
        0.0,
        0.0,
        raster.width() as f64,
        raster.height() as f64,
    );
    let hit_size = MARKER_HIT_SIZE as f64;

    let mut table: Vec<Marker> = Vec::new();
    let mut region_rects: Vec<Bounds> = Vec::new();
    let mut region_slots: Vec<Vec<usize>> = Vec::new();
    let mut by_rect: FxHashMap<(i32, i32, i32, i32), usize> = FxHashMap::default();

    for marker in markers {
        if !marker.position.is_valid() {
            log::debug!("skipping marker {} with out-of-range position", marker.id);
            continue;
        }

        let screen = marker.position.to_world_pixel(zoom).subtract(&top_left);
        let ix = screen.x.round() as i32;
        let iy = screen.y.round() as i32;

        let hit_box = Bounds::from_center_and_size(
            Point::new(ix as f64, iy as f64),
            hit_size,
            hit_size,
        );
        let clamped = match hit_box.intersection(&raster_bounds) {
            Some(rect) => rect,
            None => continue,
        };

        draw_glyph(raster, ix, iy, marker.style);

        if clamped.width() <= 0.0 || clamped.height() <= 0.0 {
            continue;
        }

        // Hit-box corners are whole pixels, so the clamped rect keys exactly.
        let key = (
            clamped.min.x as i32,
            clamped.min.y as i32,
            clamped.max.x as i32,
            clamped.max.y as i32,
        );
        let region = *by_rect.entry(key).or_insert_with(|| {
            region_rects.push(clamped.clone());
            region_slots.push(Vec::new());
            region_slots.len() - 1
        });

        let slots = &mut region_slots[region];
        if slots.iter().any(|&slot| table[slot].id == marker.id) {
            continue;
        }
        slots.push(table.len());
        table.push(*marker);
    }

    let regions = region_rects
        .into_iter()
        .zip(region_slots)
        .map(|(rect, slots)| HitRegion::new(rect, slots))
        .collect();

    HitIndex::new(regions, table)
}

/// Shadowed filled circle with a darker border, centered on (cx, cy).
fn draw_glyph(raster: &mut RgbaImage, cx: i32, cy: i32, style: MarkerStyle) {
    fill_disc(
        raster,
        cx + MARKER_SHADOW_OFFSET,
        cy + MARKER_SHADOW_OFFSET,
        MARKER_RADIUS,
        SHADOW,
        true,
    );
    fill_disc(raster, cx, cy, MARKER_RADIUS, style.border(), false);
    fill_disc(
        raster,
        cx,
        cy,
        MARKER_RADIUS - MARKER_BORDER_WIDTH,
        style.fill(),
        false,
    );
}

fn fill_disc(raster: &mut RgbaImage, cx: i32, cy: i32, r: i32, color: Rgba<u8>, blend: bool) {
    let width = raster.width() as i32;
    let height = raster.height() as i32;

    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let x = cx + dx;
            let y = cy + dy;
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            if blend {
                let dst = *raster.get_pixel(x as u32, y as u32);
                raster.put_pixel(x as u32, y as u32, blend_over(color, dst));
            } else {
                raster.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let alpha = src.0[3] as f32 / 255.0;
    let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
    Rgba([
        mix(src.0[0], dst.0[0]),
        mix(src.0[1], dst.0[1]),
        mix(src.0[2], dst.0[2]),
        255,
    ])
}
