//! Stamping marks, measurement points, and bounding-box edges onto a
//! finished raster.
//!
//! All coordinates here are output-raster pixels. The `scene_depth`
//! callback reports the nearest object depth at an output pixel (0 when
//! uncovered); hidden edges and occluded marks use it to stay behind the
//! rendered objects.

use serde::{Deserialize, Serialize};

use voxview_compose::raster::OutputRaster;
use voxview_compose::tables::{ColorTables, MARK_SHADE, RGB_BACKGROUND};
use voxview_core::scene::RenderingClass;

use crate::line::line_points;

/// Depth probe over the rendered scene at an output pixel.
pub type SceneDepth<'a> = &'a dyn Fn(i32, i32) -> i32;

/// What the overlay pass draws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayOptions {
    pub box_visible: bool,
    pub marks_visible: bool,
    /// Mark color, full scale 65535 per component (direct-RGB frames).
    pub mark_color: [u16; 3],
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            box_visible: false,
            marks_visible: true,
            mark_color: [65535, 65535, 65535],
        }
    }
}

/// The device bytes a mark pixel takes, resolved once per overlay pass.
#[derive(Debug, Clone, Copy)]
pub struct Ink {
    bytes: [u8; 4],
    len: usize,
}

impl Ink {
    /// Indexed classes use the reserved mark shade; direct-RGB maps the
    /// mark color through the value table.
    pub fn resolve(class: RenderingClass, tables: &ColorTables, mark_color: [u16; 3]) -> Self {
        match class {
            RenderingClass::Indexed | RenderingClass::Luminance => Self {
                bytes: tables.shade_bytes(0, MARK_SHADE),
                len: 4,
            },
            RenderingClass::DirectRgb => {
                let scale = (RGB_BACKGROUND - 1) as u32;
                let mut bytes = [0u8; 4];
                for channel in 0..3 {
                    let sample = (mark_color[channel] as u32 * scale / 65535) as u16;
                    bytes[channel] = tables.value_byte(sample);
                }
                Self { bytes, len: 3 }
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

fn stamp(raster: &mut OutputRaster, ink: &Ink, x: i32, y: i32) {
    if raster.contains(x, y) {
        raster
            .pixel_mut(x as usize, y as usize)
            .copy_from_slice(ink.bytes());
    }
}

/// Draw a segment, clipping to the raster.
pub fn draw_segment(raster: &mut OutputRaster, ink: &Ink, from: (i32, i32), to: (i32, i32)) {
    for (x, y) in line_points(from.0, from.1, to.0, to.1) {
        stamp(raster, ink, x, y);
    }
}

/// Draw a segment only where no object covers the pixel, so the line
/// reads as passing behind the scene.
pub fn draw_hidden_segment(
    raster: &mut OutputRaster,
    ink: &Ink,
    from: (i32, i32),
    to: (i32, i32),
    scene_depth: SceneDepth,
) {
    for (x, y) in line_points(from.0, from.1, to.0, to.1) {
        if raster.contains(x, y) && scene_depth(x, y) == 0 {
            stamp(raster, ink, x, y);
        }
    }
}

/// A small diamond cross centered on a point.
pub fn draw_mark(raster: &mut OutputRaster, ink: &Ink, x: i32, y: i32) {
    for dx in -3i32..=3 {
        for dy in -3i32..=3 {
            if (dx + dy).abs() < 2 || (dx - dy).abs() < 2 {
                stamp(raster, ink, x + dx, y + dy);
            }
        }
    }
}

/// Measurement points joined by segments. A point whose depth lies behind
/// the scene at its pixel is skipped; visible points get corner ticks.
pub fn draw_measurement_marks(
    raster: &mut OutputRaster,
    ink: &Ink,
    points: &[(i32, i32, i32)],
    scene_depth: SceneDepth,
) {
    for &(x, y, z) in points {
        if scene_depth(x, y) > z {
            continue;
        }
        for d in 1..3 {
            for corner_x in [x - d, x + d] {
                for corner_y in [y - d, y + d] {
                    stamp(raster, ink, corner_x, corner_y);
                }
            }
        }
    }
    for pair in points.windows(2) {
        draw_segment(
            raster,
            ink,
            (pair[0].0, pair[0].1),
            (pair[1].0, pair[1].1),
        );
    }
}

/// The 12 edges of a projected bounding box. Corners are indexed by axis
/// bits (bit 0 = x, bit 1 = y, bit 2 = z); the first two components are
/// output pixels and the third is depth. Edges meeting the farthest
/// corner are drawn hidden, behind the objects.
pub fn draw_box(
    raster: &mut OutputRaster,
    ink: &Ink,
    corners: &[[f64; 3]; 8],
    scene_depth: SceneDepth,
) {
    let mut farthest = 0;
    for (index, corner) in corners.iter().enumerate() {
        if corner[2] > corners[farthest][2] {
            farthest = index;
        }
    }
    for j in 0..8usize {
        for k in [1usize, 2, 4] {
            if j & k != 0 {
                continue;
            }
            let from = (corners[j][0].round() as i32, corners[j][1].round() as i32);
            let to = (
                corners[j | k][0].round() as i32,
                corners[j | k][1].round() as i32,
            );
            if j == farthest || (j | k) == farthest {
                draw_hidden_segment(raster, ink, from, to, scene_depth);
            } else {
                draw_segment(raster, ink, from, to);
            }
        }
    }
}
