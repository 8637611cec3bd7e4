use std::collections::TryReserveError;

use log::{debug, warn};

use crate::geometry::PixelRect;

/// One input rectangle for the partitioner: an object's buffer footprint
/// and whether that object is fully opaque.
#[derive(Debug, Clone, Copy)]
pub struct RegionSource {
    pub rect: PixelRect,
    pub opaque: bool,
}

/// A disjoint region of the canvas together with the exact set of objects
/// whose images cover it.
///
/// `contributors` holds indices into the scene's active-object list, fully
/// opaque objects first (`opaque_len` of them), semi-transparent objects
/// after; both partitions are in scene traversal order. That order breaks
/// equal-depth ties during blending; the primary blend order is per-pixel
/// depth.
#[derive(Debug, Clone)]
pub struct Region {
    pub rect: PixelRect,
    pub plane: bool,
    pub contributors: Vec<usize>,
    pub opaque_len: usize,
}

impl Region {
    fn root(canvas: PixelRect) -> Self {
        Self {
            rect: canvas,
            plane: false,
            contributors: Vec::new(),
            opaque_len: 0,
        }
    }
}

/// Divide the canvas into a minimal disjoint rectangle cover where every
/// region knows exactly which objects (and whether the cutting plane)
/// cover it.
///
/// Starting from `B = {canvas}`, each input rectangle `A` splits every
/// overlapping region into up to four outside pieces — the rows above and
/// below `A`'s band first, then the columns left and right within the
/// band — plus the exact intersection, which inherits the region's
/// contributors and appends `A`. Sources that fall entirely outside the
/// canvas are skipped. The plane rectangle carries no contributor; it only
/// sets the region's plane flag.
///
/// Any allocation failure aborts the whole partition; regions built so far
/// are dropped.
pub fn partition(
    canvas: PixelRect,
    plane: Option<PixelRect>,
    sources: &[RegionSource],
) -> Result<Vec<Region>, TryReserveError> {
    let mut regions = Vec::new();
    regions.try_reserve(1)?;
    regions.push(Region::root(canvas));

    if let Some(p) = plane {
        match p.intersection(&canvas) {
            Some(clipped) => regions = overlay_rect(regions, clipped, None)?,
            None => debug!("cutting plane lies outside the canvas"),
        }
    }
    for (index, source) in sources.iter().enumerate() {
        let Some(clipped) = source.rect.intersection(&canvas) else {
            warn!("object {index} projects outside the canvas; skipped");
            continue;
        };
        regions = overlay_rect(regions, clipped, Some((index, source.opaque)))?;
    }
    debug!("partitioned canvas into {} regions", regions.len());
    Ok(regions)
}

/// One pass of the subdivision: overlay rectangle `a` onto the current
/// disjoint cover. `contributor` is `None` for the plane rectangle.
fn overlay_rect(
    current: Vec<Region>,
    a: PixelRect,
    contributor: Option<(usize, bool)>,
) -> Result<Vec<Region>, TryReserveError> {
    let mut next = Vec::new();
    next.try_reserve(current.len())?;
    for mut region in current {
        if !region.rect.overlaps(&a) {
            next.try_reserve(1)?;
            next.push(region);
            continue;
        }

        // Rows outside a's band, full region width.
        let b = region.rect;
        if b.y < a.y {
            let piece = PixelRect::new(b.x, b.y, b.width, a.y - b.y);
            push_piece(&mut next, &region, piece)?;
            region.rect.y = a.y;
            region.rect.height -= piece.height;
        }
        if region.rect.bottom() > a.bottom() {
            let piece = PixelRect::new(
                region.rect.x,
                a.bottom(),
                region.rect.width,
                region.rect.bottom() - a.bottom(),
            );
            push_piece(&mut next, &region, piece)?;
            region.rect.height -= piece.height;
        }
        // Columns outside a's range, within the band.
        if region.rect.x < a.x {
            let piece = PixelRect::new(
                region.rect.x,
                region.rect.y,
                a.x - region.rect.x,
                region.rect.height,
            );
            push_piece(&mut next, &region, piece)?;
            region.rect.x = a.x;
            region.rect.width -= piece.width;
        }
        if region.rect.right() > a.right() {
            let piece = PixelRect::new(
                a.right(),
                region.rect.y,
                region.rect.right() - a.right(),
                region.rect.height,
            );
            push_piece(&mut next, &region, piece)?;
            region.rect.width -= piece.width;
        }

        // What remains of the region is exactly the intersection.
        debug_assert_eq!(Some(region.rect), b.intersection(&a));
        match contributor {
            Some((index, opaque)) => {
                region.contributors.try_reserve(1)?;
                if opaque {
                    region.contributors.insert(region.opaque_len, index);
                    region.opaque_len += 1;
                } else {
                    region.contributors.push(index);
                }
            }
            None => region.plane = true,
        }
        next.try_reserve(1)?;
        next.push(region);
    }
    Ok(next)
}

fn push_piece(
    next: &mut Vec<Region>,
    from: &Region,
    rect: PixelRect,
) -> Result<(), TryReserveError> {
    debug_assert!(!rect.is_empty());
    let mut contributors = Vec::new();
    contributors.try_reserve(from.contributors.len())?;
    contributors.extend_from_slice(&from.contributors);
    next.try_reserve(1)?;
    next.push(Region {
        rect,
        plane: from.plane,
        contributors,
        opaque_len: from.opaque_len,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelPoint;

    fn opaque(x: i32, y: i32, w: i32, h: i32) -> RegionSource {
        RegionSource {
            rect: PixelRect::new(x, y, w, h),
            opaque: true,
        }
    }

    fn translucent(x: i32, y: i32, w: i32, h: i32) -> RegionSource {
        RegionSource {
            rect: PixelRect::new(x, y, w, h),
            opaque: false,
        }
    }

    /// The regions must tile the canvas exactly: pairwise disjoint, union
    /// equal to the canvas.
    fn assert_tiles(canvas: PixelRect, regions: &[Region]) {
        let total: i64 = regions.iter().map(|r| r.rect.area()).sum();
        assert_eq!(total, canvas.area(), "region areas must sum to the canvas");
        for (i, a) in regions.iter().enumerate() {
            assert!(!a.rect.is_empty());
            assert!(canvas.intersection(&a.rect) == Some(a.rect));
            for b in &regions[i + 1..] {
                assert!(
                    !a.rect.overlaps(&b.rect),
                    "regions {:?} and {:?} overlap",
                    a.rect,
                    b.rect
                );
            }
        }
    }

    fn region_at<'a>(regions: &'a [Region], x: i32, y: i32) -> &'a Region {
        regions
            .iter()
            .find(|r| r.rect.contains_point(PixelPoint::new(x, y)))
            .expect("canvas point must be covered")
    }

    #[test]
    fn test_empty_scene_is_one_region() {
        let canvas = PixelRect::new(-8, -8, 16, 16);
        let regions = partition(canvas, None, &[]).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, canvas);
        assert!(regions[0].contributors.is_empty());
    }

    #[test]
    fn test_single_object_contributor_lists() {
        let canvas = PixelRect::new(0, 0, 16, 16);
        let regions = partition(canvas, None, &[opaque(4, 4, 8, 8)]).unwrap();
        assert_tiles(canvas, &regions);
        assert_eq!(region_at(&regions, 6, 6).contributors, vec![0]);
        assert!(region_at(&regions, 1, 1).contributors.is_empty());
        assert!(region_at(&regions, 13, 13).contributors.is_empty());
    }

    #[test]
    fn test_overlapping_objects() {
        let canvas = PixelRect::new(0, 0, 16, 16);
        let regions = partition(
            canvas,
            None,
            &[opaque(0, 0, 10, 10), opaque(6, 6, 10, 10)],
        )
        .unwrap();
        assert_tiles(canvas, &regions);
        assert_eq!(region_at(&regions, 2, 2).contributors, vec![0]);
        assert_eq!(region_at(&regions, 8, 8).contributors, vec![0, 1]);
        assert_eq!(region_at(&regions, 12, 12).contributors, vec![1]);
    }

    #[test]
    fn test_opaque_prefix_ordering() {
        let canvas = PixelRect::new(0, 0, 8, 8);
        // Scene order: translucent, opaque, translucent. The opaque object
        // must land at the head of the list; suffix keeps scene order.
        let regions = partition(
            canvas,
            None,
            &[
                translucent(0, 0, 8, 8),
                opaque(0, 0, 8, 8),
                translucent(0, 0, 8, 8),
            ],
        )
        .unwrap();
        assert_tiles(canvas, &regions);
        let r = region_at(&regions, 4, 4);
        assert_eq!(r.contributors, vec![1, 0, 2]);
        assert_eq!(r.opaque_len, 1);
    }

    #[test]
    fn test_plane_flag() {
        let canvas = PixelRect::new(0, 0, 16, 16);
        let regions = partition(
            canvas,
            Some(PixelRect::new(0, 0, 8, 16)),
            &[opaque(4, 4, 8, 8)],
        )
        .unwrap();
        assert_tiles(canvas, &regions);
        assert!(region_at(&regions, 2, 2).plane);
        let shared = region_at(&regions, 6, 6);
        assert!(shared.plane);
        assert_eq!(shared.contributors, vec![0]);
        let object_only = region_at(&regions, 12, 8);
        assert!(!object_only.plane);
        assert_eq!(object_only.contributors, vec![0]);
        assert!(!region_at(&regions, 12, 1).plane);
    }

    #[test]
    fn test_offscreen_object_skipped() {
        let canvas = PixelRect::new(0, 0, 8, 8);
        let regions = partition(canvas, None, &[opaque(20, 20, 4, 4)]).unwrap();
        assert_eq!(regions.len(), 1);
        assert!(regions[0].contributors.is_empty());
    }

    #[test]
    fn test_object_clipped_to_canvas() {
        let canvas = PixelRect::new(0, 0, 8, 8);
        let regions = partition(canvas, None, &[opaque(-4, -4, 8, 8)]).unwrap();
        assert_tiles(canvas, &regions);
        assert_eq!(region_at(&regions, 1, 1).rect, PixelRect::new(0, 0, 4, 4));
        assert_eq!(region_at(&regions, 1, 1).contributors, vec![0]);
    }

    #[test]
    fn test_cross_overlap_tiling() {
        // A horizontal and a vertical bar crossing in the middle.
        let canvas = PixelRect::new(0, 0, 12, 12);
        let regions = partition(
            canvas,
            None,
            &[opaque(0, 4, 12, 4), opaque(4, 0, 4, 12)],
        )
        .unwrap();
        assert_tiles(canvas, &regions);
        assert_eq!(region_at(&regions, 6, 6).contributors, vec![0, 1]);
        assert_eq!(region_at(&regions, 1, 6).contributors, vec![0]);
        assert_eq!(region_at(&regions, 6, 1).contributors, vec![1]);
        assert!(region_at(&regions, 1, 1).contributors.is_empty());
    }
}
