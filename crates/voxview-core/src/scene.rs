use serde::{Deserialize, Serialize};

use crate::geometry::PixelRect;
use crate::object::{ObjectImageBuffer, Opacity, VirtualObject};
use crate::plane::CutPlane;

/// Ratio between projection-buffer resolution and the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingMode {
    /// One buffer sample fills a 2x2 output block.
    Replicate,
    /// A 2x2 buffer block is averaged into one output pixel.
    AntiAlias,
    /// A 4x4 buffer block is averaged into one output pixel.
    Icon,
}

impl SamplingMode {
    /// Output pixels per buffer pixel along one axis.
    pub fn output_factor(&self) -> f64 {
        match self {
            SamplingMode::Replicate => 2.0,
            SamplingMode::AntiAlias => 0.5,
            SamplingMode::Icon => 0.25,
        }
    }

    /// Buffer samples averaged per output pixel along one axis
    /// (1 for replicate).
    pub fn block(&self) -> i32 {
        match self {
            SamplingMode::Replicate => 1,
            SamplingMode::AntiAlias => 2,
            SamplingMode::Icon => 4,
        }
    }
}

/// The blending contract in force for the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderingClass {
    /// u8 shade samples mapped through the shade table.
    Indexed,
    /// u16 intensity samples mapped through the value table, then the
    /// shade table. The only class that supports MIP.
    Luminance,
    /// u16 RGB samples blended directly; the shade table is skipped.
    DirectRgb,
}

/// One visible object paired with its projected buffer for the frame's
/// supersampling tier.
#[derive(Debug, Clone, Copy)]
pub struct SceneObject<'a> {
    pub object: &'a VirtualObject,
    pub buffer: &'a ObjectImageBuffer,
}

/// Everything one composite call needs, threaded explicitly — the
/// compositor holds no state of its own.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    /// Canvas rectangle in buffer-pixel space. The output raster covers
    /// exactly this rectangle, scaled by the mode's output factor.
    pub canvas: PixelRect,
    pub objects: Vec<SceneObject<'a>>,
    pub plane: Option<CutPlane>,
    pub mode: SamplingMode,
    pub class: RenderingClass,
    /// Background color (full scale 65535 per component); only the
    /// direct-RGB class uses it, the indexed classes take the background
    /// shade from the table.
    pub background: [u16; 3],
    pub mip: bool,
}

impl<'a> RenderRequest<'a> {
    /// MIP applies only to the luminance class; the flag is ignored for
    /// every other class.
    pub fn effective_mip(&self) -> bool {
        self.mip && self.class == RenderingClass::Luminance
    }

    /// The objects that actually contribute to this frame, with their
    /// opacities resolved.
    ///
    /// Objects that are off or secondary are dropped. A scene whose only
    /// visible object has a uniform opacity is composited with that
    /// opacity forced to 1.0, so a lone object never fades against the
    /// empty background.
    pub fn active_objects(&self) -> Vec<ActiveObject<'a>> {
        let mut active: Vec<ActiveObject<'a>> = self
            .objects
            .iter()
            .filter(|s| s.object.on && !s.object.secondary)
            .map(|s| {
                let (opacity, per_pixel) = match s.object.opacity {
                    Opacity::Uniform(o) => (o, false),
                    Opacity::PerPixel => {
                        if s.buffer.opacity.is_some() {
                            (1.0, true)
                        } else {
                            log::warn!(
                                "object {} declares per-pixel opacity but its buffer \
                                 carries none; treating as opaque",
                                s.object.name
                            );
                            (1.0, false)
                        }
                    }
                };
                ActiveObject {
                    object: s.object,
                    buffer: s.buffer,
                    opacity,
                    per_pixel,
                }
            })
            .collect();
        if active.len() == 1 && !active[0].per_pixel {
            active[0].opacity = 1.0;
        }
        active
    }
}

/// A visible object with its frame-effective opacity.
#[derive(Debug, Clone, Copy)]
pub struct ActiveObject<'a> {
    pub object: &'a VirtualObject,
    pub buffer: &'a ObjectImageBuffer,
    opacity: f32,
    per_pixel: bool,
}

impl<'a> ActiveObject<'a> {
    /// Fully opaque objects form the contributor-list prefix and reduce
    /// to nearest-wins during blending.
    pub fn is_opaque(&self) -> bool {
        !self.per_pixel && self.opacity >= 1.0
    }

    pub fn has_per_pixel_opacity(&self) -> bool {
        self.per_pixel
    }

    /// Opacity in 0.0..=1.0 at the given flat buffer index.
    pub fn opacity_fraction(&self, index: usize) -> f32 {
        if self.per_pixel {
            match &self.buffer.opacity {
                Some(bytes) => bytes[index] as f32 * (1.0 / 255.0),
                None => 1.0,
            }
        } else {
            self.opacity
        }
    }

    /// True when this object fully occludes everything behind it at the
    /// given flat buffer index (opacity byte 255 / uniform 1.0).
    pub fn occludes_at(&self, index: usize) -> bool {
        if self.per_pixel {
            match &self.buffer.opacity {
                Some(bytes) => bytes[index] == 255,
                None => true,
            }
        } else {
            self.opacity >= 1.0
        }
    }

    /// Shade-table row for indexed classes (0 for direct-RGB objects).
    pub fn color_index(&self) -> u8 {
        match self.object.color {
            crate::object::DisplayColor::Indexed(c) => c,
            crate::object::DisplayColor::Rgb => 0,
        }
    }
}

/// A serializable scene description, as stored in the host application's
/// project files. Image buffers are regenerated by the projector and are
/// not part of the description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    pub objects: Vec<VirtualObject>,
    pub plane: Option<CutPlane>,
    pub mode: SamplingMode,
    pub class: RenderingClass,
    pub background: [u16; 3],
    pub mip: bool,
}

impl SceneDescription {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::SampleData;

    fn buffer() -> ObjectImageBuffer {
        ObjectImageBuffer::new([0, 0], 4, SampleData::Shade(vec![0; 16]))
    }

    #[test]
    fn test_active_filters_off_and_secondary() {
        let buf = buffer();
        let on = VirtualObject::new("on");
        let mut off = VirtualObject::new("off");
        off.on = false;
        let secondary = VirtualObject::new("other").as_secondary();
        let request = RenderRequest {
            canvas: PixelRect::new(0, 0, 4, 4),
            objects: vec![
                SceneObject { object: &on, buffer: &buf },
                SceneObject { object: &off, buffer: &buf },
                SceneObject { object: &secondary, buffer: &buf },
            ],
            plane: None,
            mode: SamplingMode::Replicate,
            class: RenderingClass::Indexed,
            background: [0; 3],
            mip: false,
        };
        let active = request.active_objects();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].object.name, "on");
    }

    #[test]
    fn test_lone_object_rendered_opaque() {
        let buf = buffer();
        let ghost = VirtualObject::new("ghost").with_opacity(Opacity::Uniform(0.4));
        let request = RenderRequest {
            canvas: PixelRect::new(0, 0, 4, 4),
            objects: vec![SceneObject { object: &ghost, buffer: &buf }],
            plane: None,
            mode: SamplingMode::Replicate,
            class: RenderingClass::Indexed,
            background: [0; 3],
            mip: false,
        };
        let active = request.active_objects();
        assert!(active[0].is_opaque());

        // With a second visible object the opacity is honored.
        let solid = VirtualObject::new("solid");
        let request = RenderRequest {
            objects: vec![
                SceneObject { object: &ghost, buffer: &buf },
                SceneObject { object: &solid, buffer: &buf },
            ],
            ..request
        };
        let active = request.active_objects();
        assert!(!active[0].is_opaque());
        assert!((active[0].opacity_fraction(0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_mip_limited_to_luminance() {
        let buf = buffer();
        let o = VirtualObject::new("o");
        let mut request = RenderRequest {
            canvas: PixelRect::new(0, 0, 4, 4),
            objects: vec![SceneObject { object: &o, buffer: &buf }],
            plane: None,
            mode: SamplingMode::Replicate,
            class: RenderingClass::Indexed,
            background: [0; 3],
            mip: true,
        };
        assert!(!request.effective_mip());
        request.class = RenderingClass::Luminance;
        assert!(request.effective_mip());
    }

    #[test]
    fn test_scene_description_round_trip() {
        let desc = SceneDescription {
            objects: vec![VirtualObject::new("spleen")],
            plane: Some(CutPlane::new(
                [[0.0, 0.0, 1.0]; 4],
                [65535, 65535, 32768],
            )),
            mode: SamplingMode::AntiAlias,
            class: RenderingClass::Luminance,
            background: [0, 0, 0],
            mip: true,
        };
        let json = desc.to_json().unwrap();
        let back = SceneDescription::from_json(&json).unwrap();
        assert_eq!(back.objects[0].name, "spleen");
        assert_eq!(back.mode, SamplingMode::AntiAlias);
        assert!(back.plane.is_some());
    }
}
