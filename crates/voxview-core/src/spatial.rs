use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{PixelPoint, PixelRect};
use crate::object::SampleData;
use crate::scene::ActiveObject;

/// An entry in the R-tree spatial index, referencing an active object by
/// its index in the scene's active-object list.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub object_index: usize,
    pub rect: PixelRect,
}

impl RTreeObject for ObjectEntry {
    type Envelope = AABB<[i32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        // AABB corners are inclusive; the rect's right/bottom are not.
        AABB::from_corners(
            [self.rect.x, self.rect.y],
            [self.rect.right() - 1, self.rect.bottom() - 1],
        )
    }
}

/// Spatial index over object buffer footprints, backing pick queries.
pub struct ObjectIndex {
    tree: RTree<ObjectEntry>,
}

impl ObjectIndex {
    /// Build the index for a frame's active objects.
    pub fn build(objects: &[ActiveObject]) -> Self {
        let entries = objects
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.buffer.rect().is_empty())
            .map(|(object_index, o)| ObjectEntry {
                object_index,
                rect: o.buffer.rect(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Entries whose buffer rectangle contains the given point.
    pub fn query_point(&self, point: PixelPoint) -> Vec<&ObjectEntry> {
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x, point.y]))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Result of a pick query: which object owns the pixel and at what depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickResult {
    pub object_index: usize,
    pub depth: i32,
}

/// The object visible at a buffer-space point.
///
/// Normally the nearest (largest-depth) object wins; under MIP the
/// brightest luminance sample wins instead. `include_translucent` controls
/// whether semi-transparent objects may take the pick. Returns `None` when
/// no object covers the point.
pub fn pick_at(
    objects: &[ActiveObject],
    index: &ObjectIndex,
    point: PixelPoint,
    include_translucent: bool,
    mip: bool,
) -> Option<PickResult> {
    let mut best: Option<PickResult> = None;
    let mut best_luminance: u32 = 0;
    for entry in index.query_point(point) {
        let object = &objects[entry.object_index];
        if !include_translucent && !object.is_opaque() {
            continue;
        }
        let flat = object.buffer.flat_index(point.x, point.y);
        let depth = object.buffer.depth[flat];
        if mip {
            let luminance = match &object.buffer.samples {
                SampleData::Luminance(v) => v[flat] as u32,
                _ => 0,
            };
            if best.is_none() || (depth > 0 && luminance > best_luminance) {
                best = Some(PickResult {
                    object_index: entry.object_index,
                    depth,
                });
                best_luminance = luminance;
            }
        } else if depth > best.map_or(0, |b| b.depth) {
            best = Some(PickResult {
                object_index: entry.object_index,
                depth,
            });
        }
    }
    best.filter(|b| b.depth > 0)
}

/// Depth of the nearest object at a point, 0 when uncovered. The overlay
/// renderer uses this for its hidden-line test.
pub fn nearest_depth(objects: &[ActiveObject], index: &ObjectIndex, point: PixelPoint) -> i32 {
    pick_at(objects, index, point, true, false).map_or(0, |p| p.depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;
    use crate::object::{ObjectImageBuffer, Opacity, VirtualObject};
    use crate::scene::{RenderRequest, RenderingClass, SamplingMode, SceneObject};

    fn request<'a>(objects: Vec<SceneObject<'a>>, class: RenderingClass) -> RenderRequest<'a> {
        RenderRequest {
            canvas: PixelRect::new(0, 0, 8, 8),
            objects,
            plane: None,
            mode: SamplingMode::Replicate,
            class,
            background: [0; 3],
            mip: false,
        }
    }

    #[test]
    fn test_nearest_object_wins_pick() {
        let far = ObjectImageBuffer::new([0, 0], 8, SampleData::Shade(vec![10; 64]))
            .with_depth(vec![100; 64]);
        let near = ObjectImageBuffer::new([0, 0], 4, SampleData::Shade(vec![20; 16]))
            .with_depth(vec![200; 16]);
        let a = VirtualObject::new("far");
        let b = VirtualObject::new("near");
        let req = request(
            vec![
                SceneObject { object: &a, buffer: &far },
                SceneObject { object: &b, buffer: &near },
            ],
            RenderingClass::Indexed,
        );
        let active = req.active_objects();
        let index = ObjectIndex::build(&active);
        assert_eq!(index.len(), 2);

        let hit = pick_at(&active, &index, PixelPoint::new(2, 2), true, false).unwrap();
        assert_eq!(hit.object_index, 1);
        assert_eq!(hit.depth, 200);

        // Outside the small buffer only the far object remains.
        let hit = pick_at(&active, &index, PixelPoint::new(6, 6), true, false).unwrap();
        assert_eq!(hit.object_index, 0);
        assert!(pick_at(&active, &index, PixelPoint::new(20, 2), true, false).is_none());
    }

    #[test]
    fn test_translucent_excluded_from_opaque_pick() {
        let buf = ObjectImageBuffer::new([0, 0], 8, SampleData::Shade(vec![10; 64]))
            .with_depth(vec![100; 64]);
        let solid = VirtualObject::new("solid");
        let ghost = VirtualObject::new("ghost").with_opacity(Opacity::Uniform(0.5));
        let req = request(
            vec![
                SceneObject { object: &ghost, buffer: &buf },
                SceneObject { object: &solid, buffer: &buf },
            ],
            RenderingClass::Indexed,
        );
        let active = req.active_objects();
        let index = ObjectIndex::build(&active);
        let hit = pick_at(&active, &index, PixelPoint::new(1, 1), false, false).unwrap();
        assert_eq!(hit.object_index, 1);
    }

    #[test]
    fn test_mip_pick_takes_brightest() {
        let dim = ObjectImageBuffer::new([0, 0], 4, SampleData::Luminance(vec![900; 16]))
            .with_depth(vec![300; 16]);
        let bright = ObjectImageBuffer::new([0, 0], 4, SampleData::Luminance(vec![5000; 16]))
            .with_depth(vec![100; 16]);
        let a = VirtualObject::new("dim");
        let b = VirtualObject::new("bright");
        let req = request(
            vec![
                SceneObject { object: &a, buffer: &dim },
                SceneObject { object: &b, buffer: &bright },
            ],
            RenderingClass::Luminance,
        );
        let active = req.active_objects();
        let index = ObjectIndex::build(&active);
        let hit = pick_at(&active, &index, PixelPoint::new(2, 2), true, true).unwrap();
        // The brighter sample wins even though it is farther away.
        assert_eq!(hit.object_index, 1);
        assert_eq!(hit.depth, 100);
    }
}
