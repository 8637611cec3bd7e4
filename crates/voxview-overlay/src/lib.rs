//! # VoxView Overlay
//!
//! Post-processing for finished rasters: bounding-box edges and
//! measurement marks stamped over the composited frame. Peripheral to the
//! compositor itself — everything here works on device bytes the
//! compositor already wrote.

pub mod line;
pub mod marks;

use log::debug;

use voxview_compose::raster::OutputRaster;
use voxview_compose::tables::ColorTables;
use voxview_core::scene::RenderingClass;

pub use line::line_points;
pub use marks::{
    draw_box, draw_hidden_segment, draw_mark, draw_measurement_marks, draw_segment, Ink,
    OverlayOptions, SceneDepth,
};

/// Run the whole overlay pass for one frame.
///
/// `box_corners`, when given, are the projected corners of the scene
/// bounding box (axis-bit indexed, see [`draw_box`]); `measurement_points`
/// are projected measurement locations with their depths.
pub fn render_overlay(
    raster: &mut OutputRaster,
    tables: &ColorTables,
    class: RenderingClass,
    options: &OverlayOptions,
    box_corners: Option<&[[f64; 3]; 8]>,
    measurement_points: &[(i32, i32, i32)],
    scene_depth: SceneDepth,
) {
    let ink = Ink::resolve(class, tables, options.mark_color);
    if options.box_visible {
        if let Some(corners) = box_corners {
            draw_box(raster, &ink, corners, scene_depth);
        }
    }
    if options.marks_visible && !measurement_points.is_empty() {
        debug!("stamping {} measurement points", measurement_points.len());
        draw_measurement_marks(raster, &ink, measurement_points, scene_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_overlay_honors_flags() {
        let tables = ColorTables::grayscale(1, [0.5; 3]);
        let mut data = vec![0u8; 8 * 8 * 4];
        let mut raster = OutputRaster::new(&mut data, 8, 8, 4);
        let options = OverlayOptions {
            box_visible: false,
            marks_visible: false,
            mark_color: [65535; 3],
        };
        let depth = |_: i32, _: i32| 0;
        render_overlay(
            &mut raster,
            &tables,
            RenderingClass::Indexed,
            &options,
            None,
            &[(4, 4, 10)],
            &depth,
        );
        assert!(data.iter().all(|&b| b == 0));
    }
}
