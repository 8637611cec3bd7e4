//! The per-frame composite: partition the canvas, then run the frame's
//! supersampling strategy over every region.

use log::{debug, warn};

use voxview_core::object::SampleData;
use voxview_core::partition::{partition, Region, RegionSource};
use voxview_core::scene::{ActiveObject, RenderRequest, RenderingClass, SamplingMode};

use crate::average;
use crate::blend::build_contributors;
use crate::class::{LuminanceClass, PixelClass, RgbClass, ShadeClass};
use crate::error::{cancelled, ComposeError, ComposeStatus};
use crate::raster::OutputRaster;
use crate::replicate;
use crate::tables::ColorTables;

/// Composite a frame's object buffers into the output raster.
///
/// A pure function over the request: partitions the canvas into disjoint
/// regions, resolves every pixel per the frame's rendering class, and
/// writes device bytes into `raster`. The cancellation predicate is polled
/// between regions and, in anti-alias mode, between output rows; a
/// positive poll returns `Interrupted` with the raster partially updated
/// but memory-safe. On `OutOfMemory` the whole composite aborts and the
/// frame is considered not rendered.
pub fn compose(
    request: &RenderRequest,
    tables: &ColorTables,
    raster: &mut OutputRaster,
    cancel: Option<&dyn Fn() -> bool>,
) -> Result<ComposeStatus, ComposeError> {
    debug_assert_raster_shape(request, raster);

    let active: Vec<ActiveObject> = request
        .active_objects()
        .into_iter()
        .filter(|a| {
            let matches_class = matches!(
                (&a.buffer.samples, request.class),
                (SampleData::Shade(_), RenderingClass::Indexed)
                    | (SampleData::Luminance(_), RenderingClass::Luminance)
                    | (SampleData::Rgb(_), RenderingClass::DirectRgb)
            );
            if !matches_class {
                warn!(
                    "object {} carries samples of the wrong kind for this frame's \
                     rendering class; skipped",
                    a.object.name
                );
            }
            matches_class
        })
        .collect();
    let block = request.mode.block();
    if block > 1 {
        debug_assert!(
            active.iter().all(|a| a.buffer.is_aligned_to(block)),
            "averaging-tier buffers must sit on block multiples"
        );
    }

    if cancelled(cancel) {
        return Ok(ComposeStatus::Interrupted);
    }

    let mut sources = Vec::new();
    sources.try_reserve(active.len())?;
    sources.extend(active.iter().map(|a| RegionSource {
        rect: a.buffer.rect(),
        opaque: a.is_opaque(),
    }));
    let plane_rect = request.plane.as_ref().map(|p| match request.mode {
        SamplingMode::Replicate => p.bounding_rect(),
        SamplingMode::AntiAlias => p.aligned_bounding_rect(2),
        SamplingMode::Icon => p.aligned_bounding_rect(4),
    });
    let regions = partition(request.canvas, plane_rect, &sources)?;

    let mip = request.effective_mip();
    debug_assert!(
        !mip || active.iter().all(|a| !a.has_per_pixel_opacity()),
        "MIP and per-pixel opacity are mutually exclusive"
    );
    debug!(
        "compositing {} regions, {} objects, mode {:?}, class {:?}",
        regions.len(),
        active.len(),
        request.mode,
        request.class
    );

    match request.class {
        RenderingClass::Indexed => {
            run_regions(&ShadeClass, request, &active, &regions, mip, tables, raster, cancel)
        }
        RenderingClass::Luminance => run_regions(
            &LuminanceClass,
            request,
            &active,
            &regions,
            mip,
            tables,
            raster,
            cancel,
        ),
        RenderingClass::DirectRgb => {
            let class = RgbClass::new(request.background, request.plane.as_ref().map(|p| p.tint));
            run_regions(&class, request, &active, &regions, mip, tables, raster, cancel)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_regions<C: PixelClass>(
    class: &C,
    request: &RenderRequest,
    active: &[ActiveObject],
    regions: &[Region],
    mip: bool,
    tables: &ColorTables,
    raster: &mut OutputRaster,
    cancel: Option<&dyn Fn() -> bool>,
) -> Result<ComposeStatus, ComposeError> {
    let mip = mip && C::SUPPORTS_MIP;
    for region in regions {
        if cancelled(cancel) {
            return Ok(ComposeStatus::Interrupted);
        }
        let contributors = build_contributors(region, active)?;
        let plane = if region.plane {
            request.plane.as_ref()
        } else {
            None
        };
        match request.mode {
            SamplingMode::Replicate => replicate::compose_region(
                class,
                request.canvas,
                region,
                &contributors,
                plane,
                mip,
                tables,
                raster,
            )?,
            SamplingMode::AntiAlias => {
                let status = average::compose_antialias(
                    class,
                    request.canvas,
                    region,
                    &contributors,
                    plane,
                    mip,
                    tables,
                    raster,
                    cancel,
                )?;
                if status == ComposeStatus::Interrupted {
                    return Ok(ComposeStatus::Interrupted);
                }
            }
            SamplingMode::Icon => average::compose_icon(
                class,
                request.canvas,
                region,
                &contributors,
                plane,
                mip,
                tables,
                raster,
            )?,
        }
    }
    Ok(ComposeStatus::Done)
}

fn debug_assert_raster_shape(request: &RenderRequest, raster: &OutputRaster) {
    let factor = request.mode.output_factor();
    debug_assert_eq!(
        raster.width(),
        (request.canvas.width as f64 * factor) as usize
    );
    debug_assert_eq!(
        raster.height(),
        (request.canvas.height as f64 * factor) as usize
    );
    let expected_bytes = match request.class {
        RenderingClass::Indexed | RenderingClass::Luminance => {
            crate::tables::INDEXED_PIXEL_BYTES
        }
        RenderingClass::DirectRgb => crate::tables::RGB_PIXEL_BYTES,
    };
    debug_assert_eq!(raster.pixel_bytes(), expected_bytes);
    let block = request.mode.block();
    debug_assert_eq!(request.canvas.x.rem_euclid(block), 0);
    debug_assert_eq!(request.canvas.y.rem_euclid(block), 0);
    debug_assert_eq!(request.canvas.width % block, 0);
    debug_assert_eq!(request.canvas.height % block, 0);
}
