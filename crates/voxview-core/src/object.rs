use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::PixelRect;

/// Unique object identifier.
pub type ObjectId = Uuid;

/// How an object's pixels are attenuated when other pixels lie behind them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Opacity {
    /// One opacity for every pixel, 0.0 (invisible) to 1.0 (opaque).
    Uniform(f32),
    /// The object's image buffer carries an opacity byte per pixel.
    PerPixel,
}

/// Display color of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayColor {
    /// Row index into the precomputed shade table (indexed classes).
    Indexed(u8),
    /// The buffer samples are already RGB; no table row applies.
    Rgb,
}

/// One positionable, colorable 3-D object instance contributing to a frame.
///
/// A mirrored (reflection) instance is a separate `VirtualObject` with the
/// `mirror` flag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualObject {
    pub id: ObjectId,
    pub name: String,
    pub on: bool,
    pub opacity: Opacity,
    pub color: DisplayColor,
    pub mirror: bool,
    /// Secondary objects belong to the companion image in split display
    /// modes and are excluded from the main frame.
    pub secondary: bool,
}

impl VirtualObject {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            on: true,
            opacity: Opacity::Uniform(1.0),
            color: DisplayColor::Indexed(0),
            mirror: false,
            secondary: false,
        }
    }

    pub fn with_opacity(mut self, opacity: Opacity) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_color(mut self, color: DisplayColor) -> Self {
        self.color = color;
        self
    }

    pub fn as_mirror(mut self) -> Self {
        self.mirror = true;
        self
    }

    pub fn as_secondary(mut self) -> Self {
        self.secondary = true;
        self
    }
}

/// Per-pixel sample payload of a projected object image.
///
/// Which variant a frame uses is fixed by the scene's rendering class.
#[derive(Debug, Clone)]
pub enum SampleData {
    /// Shade-table column per pixel (binary surface classes).
    Shade(Vec<u8>),
    /// 16-bit intensity per pixel (gradient-magnitude class).
    Luminance(Vec<u16>),
    /// 16-bit RGB triple per pixel (volume-render classes).
    Rgb(Vec<[u16; 3]>),
}

impl SampleData {
    pub fn len(&self) -> usize {
        match self {
            SampleData::Shade(v) => v.len(),
            SampleData::Luminance(v) => v.len(),
            SampleData::Rgb(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A projected image of one object at one supersampling tier.
///
/// The buffer is square; `position` is its top-left corner in buffer-pixel
/// space. `samples` and `depth` (and `opacity`, when present) are parallel
/// row-major arrays of `size * size` entries. A depth of 0 means the object
/// does not cover that pixel; larger depths are nearer to the viewer.
///
/// Buffers are produced by the external projector and are read-only inputs
/// to the compositor.
#[derive(Debug, Clone)]
pub struct ObjectImageBuffer {
    pub position: [i32; 2],
    pub size: i32,
    pub samples: SampleData,
    pub opacity: Option<Vec<u8>>,
    pub depth: Vec<i32>,
}

impl ObjectImageBuffer {
    pub fn new(position: [i32; 2], size: i32, samples: SampleData) -> Self {
        let n = (size as usize) * (size as usize);
        debug_assert_eq!(samples.len(), n);
        Self {
            position,
            size,
            samples,
            opacity: None,
            depth: vec![0; n],
        }
    }

    pub fn with_depth(mut self, depth: Vec<i32>) -> Self {
        debug_assert_eq!(depth.len(), (self.size as usize) * (self.size as usize));
        self.depth = depth;
        self
    }

    pub fn with_opacity(mut self, opacity: Vec<u8>) -> Self {
        debug_assert_eq!(opacity.len(), (self.size as usize) * (self.size as usize));
        self.opacity = Some(opacity);
        self
    }

    /// The buffer's footprint in buffer-pixel space.
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.position[0], self.position[1], self.size, self.size)
    }

    /// Flat index of the absolute buffer-space pixel (x, y).
    /// The pixel must lie inside `rect()`.
    pub fn flat_index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.rect().contains_point(crate::geometry::PixelPoint::new(x, y)));
        ((y - self.position[1]) as usize) * (self.size as usize)
            + (x - self.position[0]) as usize
    }

    /// Whether position and size sit on multiples of `align`. The
    /// averaging tiers require their buffers aligned to the block size
    /// (2 for anti-alias, 4 for icon).
    pub fn is_aligned_to(&self, align: i32) -> bool {
        self.position[0].rem_euclid(align) == 0
            && self.position[1].rem_euclid(align) == 0
            && self.size % align == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_defaults() {
        let o = VirtualObject::new("liver");
        assert!(o.on);
        assert_eq!(o.opacity, Opacity::Uniform(1.0));
        assert!(!o.mirror);
    }

    #[test]
    fn test_buffer_rect_and_index() {
        let buf = ObjectImageBuffer::new([-4, 2], 8, SampleData::Shade(vec![0; 64]));
        assert_eq!(buf.rect(), PixelRect::new(-4, 2, 8, 8));
        assert_eq!(buf.flat_index(-4, 2), 0);
        assert_eq!(buf.flat_index(-3, 2), 1);
        assert_eq!(buf.flat_index(-4, 3), 8);
    }

    #[test]
    fn test_alignment() {
        let buf = ObjectImageBuffer::new([2, -6], 4, SampleData::Shade(vec![0; 16]));
        assert!(buf.is_aligned_to(2));
        assert!(!buf.is_aligned_to(4));
        let odd = ObjectImageBuffer::new([1, 0], 4, SampleData::Shade(vec![0; 16]));
        assert!(!odd.is_aligned_to(2));
    }
}
