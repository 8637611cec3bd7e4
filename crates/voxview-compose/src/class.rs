//! Rendering-class strategies.
//!
//! The class is fixed for the whole frame and dispatched exactly once per
//! composite; the per-pixel loops are monomorphized over it instead of
//! re-testing a class tag at every sample.

use voxview_core::object::{ObjectImageBuffer, SampleData};

use crate::tables::{ColorTables, BACKGROUND_SHADE, PLANE_SHADE_OFFSET, RGB_BACKGROUND};

/// One rendering class: how samples are read, blended, averaged across
/// sub-samples, and turned into device pixel bytes.
///
/// Blending follows the shared contract: `out = out*(1-opacity) +
/// sample*opacity`, evaluated in f32 and truncated to the class's integer
/// precision at every step, with the backmost layer blending against 0.
pub trait PixelClass {
    type Value: Copy + PartialEq;

    const PIXEL_BYTES: usize;
    const SUPPORTS_MIP: bool;

    /// The value an uncovered pixel takes.
    fn background(&self) -> Self::Value;

    /// Read the sample at a flat buffer index.
    fn sample(&self, buffer: &ObjectImageBuffer, index: usize) -> Self::Value;

    /// Blend one layer over the accumulator (`None` = nothing behind yet).
    fn blend(&self, acc: Option<Self::Value>, sample: Self::Value, opacity: f32) -> Self::Value;

    /// MIP comparison: is `candidate` brighter than `best`?
    fn brighter(&self, candidate: Self::Value, best: Self::Value) -> bool;

    /// Average a block of sub-sample values (`None` = sub-sample
    /// uncovered). Returns `None` when the whole block is uncovered.
    fn average(&self, block: &[Option<Self::Value>]) -> Option<Self::Value>;

    /// Write the device pixel bytes for a resolved value.
    fn emit(
        &self,
        tables: &ColorTables,
        color: u8,
        value: Self::Value,
        plane_covers: bool,
        out: &mut [u8],
    );
}

/// Average for the scalar classes: uncovered sub-samples are skipped and
/// the sum is divided by the number actually covered.
fn scalar_average(block: &[Option<u16>]) -> Option<u16> {
    let mut sum: u32 = 0;
    let mut count: u32 = 0;
    for value in block.iter().flatten() {
        sum += *value as u32;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some((sum / count) as u16)
    }
}

fn blend_scalar(acc: Option<u16>, sample: u16, opacity: f32) -> u16 {
    let behind = acc.map_or(0.0, |v| v as f32);
    ((1.0 - opacity) * behind + opacity * sample as f32) as u16
}

/// Binary surface classes: u8 shade samples, shade-table lookup.
pub struct ShadeClass;

impl PixelClass for ShadeClass {
    type Value = u16;

    const PIXEL_BYTES: usize = crate::tables::INDEXED_PIXEL_BYTES;
    const SUPPORTS_MIP: bool = false;

    fn background(&self) -> u16 {
        BACKGROUND_SHADE
    }

    fn sample(&self, buffer: &ObjectImageBuffer, index: usize) -> u16 {
        match &buffer.samples {
            SampleData::Shade(v) => v[index] as u16,
            _ => {
                debug_assert!(false, "shade class requires shade samples");
                BACKGROUND_SHADE
            }
        }
    }

    fn blend(&self, acc: Option<u16>, sample: u16, opacity: f32) -> u16 {
        blend_scalar(acc, sample, opacity)
    }

    fn brighter(&self, candidate: u16, best: u16) -> bool {
        candidate > best
    }

    fn average(&self, block: &[Option<u16>]) -> Option<u16> {
        scalar_average(block)
    }

    fn emit(
        &self,
        tables: &ColorTables,
        color: u8,
        value: u16,
        plane_covers: bool,
        out: &mut [u8],
    ) {
        let column = if plane_covers {
            value + PLANE_SHADE_OFFSET
        } else {
            value
        };
        out[..Self::PIXEL_BYTES].copy_from_slice(&tables.shade_bytes(color, column));
    }
}

/// Gradient-magnitude class: u16 intensity samples mapped through the
/// value table to a shade column. The only class that supports MIP.
pub struct LuminanceClass;

impl PixelClass for LuminanceClass {
    type Value = u16;

    const PIXEL_BYTES: usize = crate::tables::INDEXED_PIXEL_BYTES;
    const SUPPORTS_MIP: bool = true;

    fn background(&self) -> u16 {
        RGB_BACKGROUND
    }

    fn sample(&self, buffer: &ObjectImageBuffer, index: usize) -> u16 {
        match &buffer.samples {
            SampleData::Luminance(v) => v[index],
            _ => {
                debug_assert!(false, "luminance class requires luminance samples");
                RGB_BACKGROUND
            }
        }
    }

    fn blend(&self, acc: Option<u16>, sample: u16, opacity: f32) -> u16 {
        blend_scalar(acc, sample, opacity)
    }

    fn brighter(&self, candidate: u16, best: u16) -> bool {
        candidate > best
    }

    fn average(&self, block: &[Option<u16>]) -> Option<u16> {
        scalar_average(block)
    }

    fn emit(
        &self,
        tables: &ColorTables,
        color: u8,
        value: u16,
        plane_covers: bool,
        out: &mut [u8],
    ) {
        let mut column = tables.shade_column(value);
        if plane_covers {
            column += PLANE_SHADE_OFFSET;
        }
        out[..Self::PIXEL_BYTES].copy_from_slice(&tables.shade_bytes(color, column));
    }
}

/// Volume-render classes: u16 RGB samples blended per channel; the shade
/// table is skipped and the plane attenuates multiplicatively.
pub struct RgbClass {
    background: [u16; 3],
    tint: [f32; 3],
}

impl RgbClass {
    /// `background` is the scene background color (full scale 65535);
    /// `tint` is the plane tint, or `None` when the frame has no plane.
    pub fn new(background: [u16; 3], tint: Option<[u16; 3]>) -> Self {
        let scale = (RGB_BACKGROUND - 1) as u32;
        let background = [
            (background[0] as u32 * scale / 65535) as u16,
            (background[1] as u32 * scale / 65535) as u16,
            (background[2] as u32 * scale / 65535) as u16,
        ];
        let tint = tint.map_or([1.0; 3], |t| {
            [
                t[0] as f32 / 65535.0,
                t[1] as f32 / 65535.0,
                t[2] as f32 / 65535.0,
            ]
        });
        Self { background, tint }
    }
}

impl PixelClass for RgbClass {
    type Value = [u16; 3];

    const PIXEL_BYTES: usize = crate::tables::RGB_PIXEL_BYTES;
    const SUPPORTS_MIP: bool = false;

    fn background(&self) -> [u16; 3] {
        self.background
    }

    fn sample(&self, buffer: &ObjectImageBuffer, index: usize) -> [u16; 3] {
        match &buffer.samples {
            SampleData::Rgb(v) => v[index],
            _ => {
                debug_assert!(false, "direct-RGB class requires RGB samples");
                self.background
            }
        }
    }

    fn blend(&self, acc: Option<[u16; 3]>, sample: [u16; 3], opacity: f32) -> [u16; 3] {
        let behind = acc.unwrap_or([0; 3]);
        [
            ((1.0 - opacity) * behind[0] as f32 + opacity * sample[0] as f32) as u16,
            ((1.0 - opacity) * behind[1] as f32 + opacity * sample[1] as f32) as u16,
            ((1.0 - opacity) * behind[2] as f32 + opacity * sample[2] as f32) as u16,
        ]
    }

    fn brighter(&self, _candidate: [u16; 3], _best: [u16; 3]) -> bool {
        false
    }

    /// Uncovered sub-samples average as the background color, so object
    /// edges fade toward the background instead of toward black.
    fn average(&self, block: &[Option<[u16; 3]>]) -> Option<[u16; 3]> {
        if block.iter().all(Option::is_none) {
            return None;
        }
        let mut out = [0u16; 3];
        for channel in 0..3 {
            let sum: u32 = block
                .iter()
                .map(|s| s.map_or(self.background[channel], |v| v[channel]) as u32)
                .sum();
            out[channel] = (sum / block.len() as u32) as u16;
        }
        Some(out)
    }

    fn emit(
        &self,
        tables: &ColorTables,
        _color: u8,
        value: [u16; 3],
        plane_covers: bool,
        out: &mut [u8],
    ) {
        for channel in 0..3 {
            let byte = tables.value_byte(value[channel]);
            out[channel] = if plane_covers {
                (byte as f32 * self.tint[channel]) as u8
            } else {
                byte
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_blend_truncates_each_step() {
        let class = ShadeClass;
        // Backmost layer blends against 0.
        assert_eq!(class.blend(None, 100, 0.5), 50);
        // (1-0.25)*50 + 0.25*80 = 57.5 -> 57
        assert_eq!(class.blend(Some(50), 80, 0.25), 57);
        // Full opacity replaces outright.
        assert_eq!(class.blend(Some(50), 80, 1.0), 80);
    }

    #[test]
    fn test_scalar_average_skips_uncovered() {
        let class = ShadeClass;
        assert_eq!(class.average(&[None, None, None, None]), None);
        assert_eq!(class.average(&[Some(100), None, None, None]), Some(100));
        assert_eq!(class.average(&[Some(100), Some(50), None, None]), Some(75));
        assert_eq!(
            class.average(&[Some(100), Some(50), Some(25), Some(25)]),
            Some(50)
        );
    }

    #[test]
    fn test_rgb_average_fills_with_background() {
        let class = RgbClass::new([65535, 0, 0], None);
        let bg = class.background();
        let got = class
            .average(&[Some([1000, 1000, 1000]), None, None, None])
            .unwrap();
        assert_eq!(got[0], ((1000 + 3 * bg[0] as u32) / 4) as u16);
        assert_eq!(got[1], 250);
    }

    #[test]
    fn test_rgb_emit_plane_tint() {
        let tables = ColorTables::direct_rgb();
        let class = RgbClass::new([0; 3], Some([32768, 65535, 0]));
        let mut out = [0u8; 3];
        class.emit(&tables, 0, [0x8000, 0x8000, 0x8000], true, &mut out);
        assert_eq!(out[0], (0x80 as f32 * (32768.0 / 65535.0)) as u8);
        assert_eq!(out[1], 0x80);
        assert_eq!(out[2], 0);
    }
}
