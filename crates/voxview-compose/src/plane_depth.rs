//! Row-wise evaluation of the cutting plane's analytic depth.

use std::collections::TryReserveError;

use voxview_core::plane::CutPlane;

/// Evaluates the plane's bilinear depth along output sub-rows.
///
/// `factor` is the number of output pixels per buffer pixel for the
/// frame's sampling mode. Depth increments along a row are precomputed
/// once (`row0`); each sub-row then only needs its left edge and starting
/// depth. Outside the plane's horizontal span the depth is 0 ("no plane").
pub(crate) struct PlaneSampler {
    top_left: [f64; 3],
    dz_dy: f64,
    dx_dy: f64,
    factor: f64,
    span: usize,
    row0: Vec<i32>,
}

impl PlaneSampler {
    pub fn new(plane: &CutPlane, factor: f64) -> Result<Self, TryReserveError> {
        let top_left = plane.top_left();
        let top_right = plane.top_right();
        let bottom_left = plane.bottom_left();

        let (dz_dx, span) = if top_right[0] > top_left[0] {
            (
                (top_right[2] - top_left[2]) / (factor * (top_right[0] - top_left[0])),
                (factor * (top_right[0] - top_left[0])).ceil() as usize,
            )
        } else {
            (0.0, 1)
        };
        let (dz_dy, dx_dy) = if bottom_left[1] > top_left[1] {
            (
                (bottom_left[2] - top_left[2]) / (factor * (bottom_left[1] - top_left[1])),
                (bottom_left[0] - top_left[0]) / (bottom_left[1] - top_left[1]),
            )
        } else {
            (0.0, 0.0)
        };

        let mut row0 = Vec::new();
        row0.try_reserve(span)?;
        row0.extend((0..span).map(|k| (k as f64 * dz_dx) as i32));

        Ok(Self {
            top_left,
            dz_dy,
            dx_dy,
            factor,
            span,
            row0,
        })
    }

    /// Fill `out` with the plane depth of each output column of one
    /// sub-row. `rect_x` is the region's left edge in buffer pixels,
    /// `buffer_row` the sub-row's whole buffer row, and `sub` its output
    /// sub-row index within that buffer row.
    pub fn fill_row(&self, out: &mut [i32], rect_x: i32, buffer_row: i32, sub: usize) {
        let row_y = buffer_row as f64 + sub as f64 / self.factor;
        let left_x = (self.factor
            * (self.top_left[0] - rect_x as f64 + self.dx_dy * (row_y - self.top_left[1])))
        .round() as i64;
        let steps = self.factor * (buffer_row as f64 - self.top_left[1]) + sub as f64;
        let left_z = (self.top_left[2] + self.dz_dy * steps).round() as i32;
        for (x, depth) in out.iter_mut().enumerate() {
            let k = x as i64 - left_x;
            *depth = if k >= 0 && (k as usize) < self.span {
                left_z + self.row0[k as usize]
            } else {
                0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A flat plane (constant z) spanning x 0..8, y 0..8.
    fn flat_plane(z: f64) -> CutPlane {
        CutPlane::new(
            [
                [0.0, 0.0, z],
                [8.0, 0.0, z],
                [0.0, 8.0, z],
                [8.0, 8.0, z],
            ],
            [65535; 3],
        )
    }

    #[test]
    fn test_flat_plane_constant_depth() {
        let sampler = PlaneSampler::new(&flat_plane(500.0), 2.0).unwrap();
        let mut row = [0i32; 16];
        sampler.fill_row(&mut row, 0, 3, 1);
        assert!(row.iter().all(|&d| d == 500));
    }

    #[test]
    fn test_depth_zero_outside_span() {
        let sampler = PlaneSampler::new(&flat_plane(500.0), 2.0).unwrap();
        // Region starting left of the plane: columns before x=0 are 0.
        let mut row = [0i32; 8];
        sampler.fill_row(&mut row, -2, 0, 0);
        assert_eq!(&row[..4], &[0, 0, 0, 0]);
        assert!(row[4..].iter().all(|&d| d == 500));
    }

    #[test]
    fn test_sloped_plane_gradient() {
        // Depth rises from 100 at the left edge to 260 at the right,
        // so 10 per output column at factor 2 over 8 buffer pixels.
        let plane = CutPlane::new(
            [
                [0.0, 0.0, 100.0],
                [8.0, 0.0, 260.0],
                [0.0, 8.0, 100.0],
                [8.0, 8.0, 260.0],
            ],
            [65535; 3],
        );
        let sampler = PlaneSampler::new(&plane, 2.0).unwrap();
        let mut row = [0i32; 16];
        sampler.fill_row(&mut row, 0, 0, 0);
        assert_eq!(row[0], 100);
        assert_eq!(row[1], 110);
        assert_eq!(row[15], 250);
    }

    #[test]
    fn test_vertical_gradient_per_subrow() {
        // Depth rises top to bottom; sub-rows within one buffer row see
        // distinct depths.
        let plane = CutPlane::new(
            [
                [0.0, 0.0, 100.0],
                [8.0, 0.0, 100.0],
                [0.0, 8.0, 420.0],
                [8.0, 8.0, 420.0],
            ],
            [65535; 3],
        );
        let sampler = PlaneSampler::new(&plane, 2.0).unwrap();
        let mut top = [0i32; 4];
        let mut next = [0i32; 4];
        sampler.fill_row(&mut top, 0, 0, 0);
        sampler.fill_row(&mut next, 0, 0, 1);
        assert_eq!(top[0], 100);
        assert_eq!(next[0], 120);
    }
}
