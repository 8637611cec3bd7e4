//! The shared per-sub-sample blending kernel.
//!
//! All three supersampling strategies resolve each sub-sample the same
//! way; they differ only in how many sub-samples feed one output pixel.

use std::collections::TryReserveError;

use voxview_core::partition::Region;
use voxview_core::scene::ActiveObject;

use crate::class::PixelClass;

/// One region contributor with its resolved shade-table row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Contributor<'a> {
    pub active: ActiveObject<'a>,
    pub color: u8,
}

/// Materialize a region's contributor list against the frame's
/// active-object slice.
pub(crate) fn build_contributors<'a>(
    region: &Region,
    objects: &[ActiveObject<'a>],
) -> Result<Vec<Contributor<'a>>, TryReserveError> {
    let mut contributors = Vec::new();
    contributors.try_reserve(region.contributors.len())?;
    for &index in &region.contributors {
        let active = objects[index];
        contributors.push(Contributor {
            active,
            color: active.color_index(),
        });
    }
    Ok(contributors)
}

/// The resolved value of one sub-sample: blended sample value, winning
/// (front-most) depth, and winning color row. `None` when no contributor
/// covers the sub-sample.
pub(crate) type Resolved<V> = Option<(V, i32, u8)>;

/// Resolve one sub-sample.
///
/// `offsets[i]` is contributor `i`'s flat buffer index for this
/// sub-sample. `order` is caller-provided scratch with capacity for
/// `contributors.len()` entries.
///
/// Contributors whose depth is 0 are absent. The rest are ordered by depth
/// descending — a stable insertion sort, so equal depths keep contributor
/// list order (scene order) — and cut after the first fully occluding
/// layer. Layers then blend back-to-front; the front-most layer's depth
/// and color win.
///
/// Under MIP, depth order is ignored and the brightest non-background
/// sample wins, ties going to the earliest contributor.
pub(crate) fn resolve_sub_sample<C: PixelClass>(
    class: &C,
    contributors: &[Contributor],
    offsets: &[usize],
    order: &mut Vec<usize>,
    mip: bool,
) -> Resolved<C::Value> {
    if mip {
        return resolve_mip(class, contributors, offsets);
    }

    order.clear();
    for index in 0..contributors.len() {
        let depth = contributors[index].active.buffer.depth[offsets[index]];
        let mut at = order.len();
        while at > 0 {
            let prior = contributors[order[at - 1]].active.buffer.depth[offsets[order[at - 1]]];
            if depth > prior {
                at -= 1;
            } else {
                break;
            }
        }
        order.insert(at, index);
    }

    // Nothing behind the first "no object" sample matters, and nothing
    // behind the first fully opaque layer shows through.
    let mut count = order.len();
    for (at, &index) in order.iter().enumerate() {
        let flat = offsets[index];
        if contributors[index].active.buffer.depth[flat] == 0 {
            count = at;
            break;
        }
        if contributors[index].active.occludes_at(flat) {
            count = at + 1;
            break;
        }
    }

    let mut acc: Option<C::Value> = None;
    let mut front: Option<(i32, u8)> = None;
    for &index in order[..count].iter().rev() {
        let contributor = &contributors[index];
        let flat = offsets[index];
        let sample = class.sample(contributor.active.buffer, flat);
        let opacity = contributor.active.opacity_fraction(flat);
        acc = Some(class.blend(acc, sample, opacity));
        front = Some((contributor.active.buffer.depth[flat], contributor.color));
    }
    match (acc, front) {
        (Some(value), Some((depth, color))) => Some((value, depth, color)),
        _ => None,
    }
}

fn resolve_mip<C: PixelClass>(
    class: &C,
    contributors: &[Contributor],
    offsets: &[usize],
) -> Resolved<C::Value> {
    let background = class.background();
    let mut value = background;
    let mut depth = 0;
    let mut color = 0;
    for (index, contributor) in contributors.iter().enumerate() {
        let flat = offsets[index];
        let sample = class.sample(contributor.active.buffer, flat);
        if value == background || (sample != background && class.brighter(sample, value)) {
            value = sample;
            depth = contributor.active.buffer.depth[flat];
            color = contributor.color;
        }
    }
    if value == background {
        None
    } else {
        Some((value, depth, color))
    }
}
