//! Pixel-replicate strategy: one buffer sample fills a 2x2 output block.
//!
//! The blend is resolved once per buffer sample; the plane depth is still
//! evaluated per output sub-pixel, so the plane edge stays sharp inside a
//! replicated block.

use voxview_core::geometry::PixelRect;
use voxview_core::partition::Region;
use voxview_core::plane::CutPlane;

use crate::blend::{resolve_sub_sample, Contributor};
use crate::class::PixelClass;
use crate::error::ComposeError;
use crate::plane_depth::PlaneSampler;
use crate::raster::OutputRaster;
use crate::tables::ColorTables;

const FACTOR: f64 = 2.0;

#[allow(clippy::too_many_arguments)]
pub(crate) fn compose_region<C: PixelClass>(
    class: &C,
    canvas: PixelRect,
    region: &Region,
    contributors: &[Contributor],
    plane: Option<&CutPlane>,
    mip: bool,
    tables: &ColorTables,
    raster: &mut OutputRaster,
) -> Result<(), ComposeError> {
    let n = contributors.len();
    let width = region.rect.width as usize;

    let mut bases = Vec::new();
    bases.try_reserve(n)?;
    bases.resize(n, 0usize);
    let mut offsets = Vec::new();
    offsets.try_reserve(n)?;
    offsets.resize(n, 0usize);
    let mut order = Vec::new();
    order.try_reserve(n)?;

    let sampler = match plane {
        Some(p) => Some(PlaneSampler::new(p, FACTOR)?),
        None => None,
    };
    let mut plane_rows: [Vec<i32>; 2] = [Vec::new(), Vec::new()];
    if sampler.is_some() {
        for row in &mut plane_rows {
            row.try_reserve(2 * width)?;
            row.resize(2 * width, 0);
        }
    }

    for rown in 0..region.rect.height {
        let y = region.rect.y + rown;
        for (i, contributor) in contributors.iter().enumerate() {
            bases[i] = contributor.active.buffer.flat_index(region.rect.x, y);
        }
        if let Some(sampler) = &sampler {
            sampler.fill_row(&mut plane_rows[0], region.rect.x, y, 0);
            sampler.fill_row(&mut plane_rows[1], region.rect.x, y, 1);
        }

        let out_y = 2 * (y - canvas.y) as usize;
        let out_x0 = 2 * (region.rect.x - canvas.x) as usize;
        for x in 0..width {
            for i in 0..n {
                offsets[i] = bases[i] + x;
            }
            let (value, depth, color) =
                match resolve_sub_sample(class, contributors, &offsets, &mut order, mip) {
                    Some(resolved) => resolved,
                    None => (class.background(), 0, 0),
                };
            for sub_y in 0..2 {
                for sub_x in 0..2 {
                    let covers = region.plane && plane_rows[sub_y][2 * x + sub_x] > depth;
                    class.emit(
                        tables,
                        color,
                        value,
                        covers,
                        raster.pixel_mut(out_x0 + 2 * x + sub_x, out_y + sub_y),
                    );
                }
            }
        }
    }
    Ok(())
}
