//! # VoxView Compose
//!
//! The multi-object pixel compositor: consumes the disjoint regions of
//! one frame together with each region's contributing object buffers and
//! writes final device bytes into the caller's raster. Three supersampling
//! strategies (replicate, anti-alias, icon) share one per-pixel blending
//! contract; the rendering class (indexed, luminance, direct-RGB) is
//! dispatched once per frame.
//!
//! The composite is a pure function: no state survives between frames,
//! cancellation is cooperative, and any allocation failure aborts the
//! whole frame.

pub mod class;
pub mod compose;
pub mod error;
pub mod raster;
pub mod tables;

mod average;
mod blend;
mod plane_depth;
mod replicate;

pub use class::{LuminanceClass, PixelClass, RgbClass, ShadeClass};
pub use compose::compose;
pub use error::{ComposeError, ComposeStatus};
pub use raster::OutputRaster;
pub use tables::ColorTables;
