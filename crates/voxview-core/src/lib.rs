//! # VoxView Core
//!
//! Scene data model and pure geometry for the VoxView compositor:
//! virtual objects with their projected image buffers, the cutting plane,
//! the region partitioner that turns overlapping object footprints into a
//! disjoint rectangle cover, and an R-tree index for pick queries.
//!
//! Everything here is a value; no state survives between frames.

pub mod geometry;
pub mod object;
pub mod partition;
pub mod plane;
pub mod scene;
pub mod spatial;

pub use geometry::{PixelPoint, PixelRect};
pub use object::{DisplayColor, ObjectId, ObjectImageBuffer, Opacity, SampleData, VirtualObject};
pub use partition::{partition, Region, RegionSource};
pub use plane::CutPlane;
pub use scene::{
    ActiveObject, RenderRequest, RenderingClass, SamplingMode, SceneDescription, SceneObject,
};
pub use spatial::{nearest_depth, pick_at, ObjectIndex, PickResult};
