//! Vector-field oracles used to perturb attractor positions.
//!
//! The growth engine only ever asks "which way, and how hard, does the field
//! push at this grid cell"; the field itself is an external concern hidden
//! behind [`DistortionField`]. [`FluidDistortion`] is the stock
//! implementation: two precomputed Perlin-noise grids, one for direction and
//! one for magnitude.

use crate::config::FlowFieldConfig;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Read-only 2D direction/magnitude oracle over a `cols × rows` grid.
///
/// Both channels are normalized to `[0, 1)`; the caller scales direction to
/// degrees and magnitude to canvas units.
pub trait DistortionField {
    fn cols(&self) -> usize;
    fn rows(&self) -> usize;

    /// Direction at a grid cell, in `[0, 1)`. Out-of-range indices clamp.
    fn direction(&self, col: usize, row: usize) -> f32;

    /// Magnitude at a grid cell, in `[0, 1)`. Out-of-range indices clamp.
    fn magnitude(&self, col: usize, row: usize) -> f32;

    /// Direction for canvas-normalized coordinates in `[0, 1]`.
    fn direction_at(&self, x: f32, y: f32) -> f32 {
        let (col, row) = self.cell_of(x, y);
        self.direction(col, row)
    }

    /// Magnitude for canvas-normalized coordinates in `[0, 1]`.
    fn magnitude_at(&self, x: f32, y: f32) -> f32 {
        let (col, row) = self.cell_of(x, y);
        self.magnitude(col, row)
    }

    /// Maps normalized coordinates to a clamped grid cell. Distorted
    /// attractors drift off-canvas, so coordinates outside `[0, 1]` are legal
    /// and saturate at the border cells.
    fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        let col = (x * self.cols() as f32).floor() as i64;
        let row = (y * self.rows() as f32).floor() as i64;
        (
            col.clamp(0, self.cols() as i64 - 1) as usize,
            row.clamp(0, self.rows() as i64 - 1) as usize,
        )
    }
}

/// Seedable flow field sampled from coherent noise.
///
/// Direction and magnitude are independent noise planes: magnitude is
/// sampled at 10× the direction frequency and a different depth offset, so
/// the two decorrelate.
pub struct FluidDistortion {
    cols: usize,
    rows: usize,
    k: f64,
    directions: Vec<f32>,
    magnitudes: Vec<f32>,
}

impl FluidDistortion {
    pub fn new(cols: usize, rows: usize, k: f64, seed: u64) -> Self {
        let perlin = Perlin::new(seed as u32);
        let mut rng = SmallRng::seed_from_u64(seed);
        let z1: f64 = rng.random_range(0.0..65536.0);
        let z2: f64 = rng.random_range(0.0..65536.0) + 65536.0;

        let mut directions = vec![0.0; cols * rows];
        let mut magnitudes = vec![0.0; cols * rows];
        for row in 0..rows {
            for col in 0..cols {
                let i = col + row * cols;
                let xk = col as f64 * k;
                let yk = row as f64 * k;
                directions[i] = to_unit(perlin.get([xk, yk, z1]));
                magnitudes[i] = to_unit(perlin.get([xk * 10.0, yk * 10.0, z2]));
            }
        }

        Self {
            cols,
            rows,
            k,
            directions,
            magnitudes,
        }
    }

    pub fn from_config(flow: &FlowFieldConfig, seed: u64) -> Self {
        Self::new(flow.cols, flow.rows, flow.k, seed)
    }

    pub fn k(&self) -> f64 {
        self.k
    }
}

/// Squashes a `[-1, 1]` noise sample into `[0, 1)`.
fn to_unit(v: f64) -> f32 {
    ((0.5 + 0.5 * v) as f32).clamp(0.0, 0.999_99)
}

impl DistortionField for FluidDistortion {
    fn cols(&self) -> usize {
        self.cols
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn direction(&self, col: usize, row: usize) -> f32 {
        let col = col.min(self.cols - 1);
        let row = row.min(self.rows - 1);
        self.directions[col + row * self.cols]
    }

    fn magnitude(&self, col: usize, row: usize) -> f32 {
        let col = col.min(self.cols - 1);
        let row = row.min(self.rows - 1);
        self.magnitudes[col + row * self.cols]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_the_unit_interval() {
        let field = FluidDistortion::new(20, 20, 0.0017, 42);
        for row in 0..20 {
            for col in 0..20 {
                let d = field.direction(col, row);
                let m = field.magnitude(col, row);
                assert!((0.0..1.0).contains(&d), "direction out of range: {d}");
                assert!((0.0..1.0).contains(&m), "magnitude out of range: {m}");
            }
        }
    }

    #[test]
    fn same_seed_gives_the_same_field() {
        let a = FluidDistortion::new(16, 16, 0.001, 9);
        let b = FluidDistortion::new(16, 16, 0.001, 9);
        for row in 0..16 {
            for col in 0..16 {
                assert_eq!(a.direction(col, row), b.direction(col, row));
                assert_eq!(a.magnitude(col, row), b.magnitude(col, row));
            }
        }
    }

    #[test]
    fn normalized_lookup_clamps_off_canvas_coordinates() {
        let field = FluidDistortion::new(8, 8, 0.001, 3);

        assert_eq!(field.direction_at(-0.5, 0.5), field.direction(0, 4));
        assert_eq!(field.direction_at(1.5, 0.5), field.direction(7, 4));
        assert_eq!(field.magnitude_at(0.5, 2.0), field.magnitude(4, 7));
    }

    #[test]
    fn grid_indices_clamp_at_the_border() {
        let field = FluidDistortion::new(8, 8, 0.001, 3);
        assert_eq!(field.direction(100, 100), field.direction(7, 7));
    }
}
