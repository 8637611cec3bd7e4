//! Averaging strategies: anti-alias (2x2 buffer block per output pixel)
//! and icon (4x4). Both run the identical per-sub-sample blend and differ
//! only in block size; anti-alias additionally polls for cancellation
//! between output rows.
//!
//! Region rectangles in these modes are block-aligned by construction:
//! the canvas and every buffer must sit on block multiples, and the plane
//! rectangle is widened to block multiples by the partition step.

use voxview_core::geometry::PixelRect;
use voxview_core::partition::Region;
use voxview_core::plane::CutPlane;

use crate::blend::{resolve_sub_sample, Contributor};
use crate::class::PixelClass;
use crate::error::{cancelled, ComposeError, ComposeStatus};
use crate::plane_depth::PlaneSampler;
use crate::raster::OutputRaster;
use crate::tables::ColorTables;

#[allow(clippy::too_many_arguments)]
pub(crate) fn compose_antialias<C: PixelClass>(
    class: &C,
    canvas: PixelRect,
    region: &Region,
    contributors: &[Contributor],
    plane: Option<&CutPlane>,
    mip: bool,
    tables: &ColorTables,
    raster: &mut OutputRaster,
    cancel: Option<&dyn Fn() -> bool>,
) -> Result<ComposeStatus, ComposeError> {
    averaged(
        class,
        canvas,
        region,
        contributors,
        plane,
        mip,
        tables,
        raster,
        2,
        cancel,
    )
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn compose_icon<C: PixelClass>(
    class: &C,
    canvas: PixelRect,
    region: &Region,
    contributors: &[Contributor],
    plane: Option<&CutPlane>,
    mip: bool,
    tables: &ColorTables,
    raster: &mut OutputRaster,
) -> Result<(), ComposeError> {
    averaged(
        class,
        canvas,
        region,
        contributors,
        plane,
        mip,
        tables,
        raster,
        4,
        None,
    )
    .map(|_| ())
}

#[allow(clippy::too_many_arguments)]
fn averaged<C: PixelClass>(
    class: &C,
    canvas: PixelRect,
    region: &Region,
    contributors: &[Contributor],
    plane: Option<&CutPlane>,
    mip: bool,
    tables: &ColorTables,
    raster: &mut OutputRaster,
    block: usize,
    cancel: Option<&dyn Fn() -> bool>,
) -> Result<ComposeStatus, ComposeError> {
    let n = contributors.len();
    let width = region.rect.width as usize;
    let height = region.rect.height as usize;
    debug_assert_eq!(width % block, 0);
    debug_assert_eq!(height % block, 0);
    debug_assert_eq!((region.rect.x - canvas.x).rem_euclid(block as i32), 0);
    debug_assert_eq!((region.rect.y - canvas.y).rem_euclid(block as i32), 0);

    let mut bases = Vec::new();
    bases.try_reserve(n * block)?;
    bases.resize(n * block, 0usize);
    let mut offsets = Vec::new();
    offsets.try_reserve(n)?;
    offsets.resize(n, 0usize);
    let mut order = Vec::new();
    order.try_reserve(n)?;
    let mut sub_values: Vec<Option<C::Value>> = Vec::new();
    sub_values.try_reserve(block * block)?;
    sub_values.resize(block * block, None);

    let sampler = match plane {
        Some(p) => Some(PlaneSampler::new(p, 1.0 / block as f64)?),
        None => None,
    };
    let mut plane_row = Vec::new();
    if sampler.is_some() {
        plane_row.try_reserve(width / block)?;
        plane_row.resize(width / block, 0);
    }

    for out_row in 0..height / block {
        if cancelled(cancel) {
            return Ok(ComposeStatus::Interrupted);
        }
        let y0 = region.rect.y + (out_row * block) as i32;
        for sub_y in 0..block {
            for (i, contributor) in contributors.iter().enumerate() {
                bases[sub_y * n + i] = contributor
                    .active
                    .buffer
                    .flat_index(region.rect.x, y0 + sub_y as i32);
            }
        }
        if let Some(sampler) = &sampler {
            sampler.fill_row(&mut plane_row, region.rect.x, y0, 0);
        }

        let out_y = ((y0 - canvas.y) as usize) / block;
        let out_x0 = ((region.rect.x - canvas.x) as usize) / block;
        for out_col in 0..width / block {
            let x0 = out_col * block;
            let mut max_depth = 0;
            let mut winning_color = 0;
            for sub_y in 0..block {
                for sub_x in 0..block {
                    for i in 0..n {
                        offsets[i] = bases[sub_y * n + i] + x0 + sub_x;
                    }
                    let resolved =
                        resolve_sub_sample(class, contributors, &offsets, &mut order, mip);
                    sub_values[sub_y * block + sub_x] = match resolved {
                        Some((value, depth, color)) => {
                            if depth > max_depth {
                                max_depth = depth;
                                winning_color = color;
                            }
                            Some(value)
                        }
                        None => None,
                    };
                }
            }
            let covers = region.plane && plane_row[out_col] > max_depth;
            let (value, color) = match class.average(&sub_values) {
                Some(value) => (value, winning_color),
                None => (class.background(), 0),
            };
            class.emit(
                tables,
                color,
                value,
                covers,
                raster.pixel_mut(out_x0 + out_col, out_y),
            );
        }
    }
    Ok(ComposeStatus::Done)
}
