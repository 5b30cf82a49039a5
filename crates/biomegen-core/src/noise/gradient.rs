//! Seeded gradient lattice with cosine-eased interpolation.
//!
//! The lattice holds 256 unit gradients whose angles are drawn from a
//! `ChaCha8Rng` seeded with the field seed, so a given seed yields the same
//! table on every platform. Lattice corners map to table entries through a
//! multiplicative hash of both coordinates.

use std::f64::consts::{PI, TAU};

use ::noise::NoiseFn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const TABLE_SIZE: usize = 256;

const HASH_X: i64 = 1_836_311_903;
const HASH_Y: i64 = 2_971_215_073;
const HASH_OFFSET: i64 = 123_456_789;

pub struct GradientLattice {
    gradients: [(f64, f64); TABLE_SIZE],
}

impl GradientLattice {
    pub fn new(seed: i64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let mut gradients = [(0.0, 0.0); TABLE_SIZE];
        for g in gradients.iter_mut() {
            let angle = rng.gen::<f64>() * TAU;
            *g = (angle.cos(), angle.sin());
        }
        Self { gradients }
    }

    pub fn gradients(&self) -> &[(f64, f64); TABLE_SIZE] {
        &self.gradients
    }

    /// Table index for lattice corner `(ix, iy)`.
    #[inline]
    pub fn hash(ix: i64, iy: i64) -> usize {
        let h = ix.wrapping_mul(HASH_X) ^ iy.wrapping_mul(HASH_Y).wrapping_add(HASH_OFFSET);
        (h & (TABLE_SIZE as i64 - 1)) as usize
    }

    #[inline]
    fn dot_corner(&self, ix: i64, iy: i64, x: f64, y: f64) -> f64 {
        let (gx, gy) = self.gradients[Self::hash(ix, iy)];
        (x - ix as f64) * gx + (y - iy as f64) * gy
    }

    /// Single-octave gradient noise at `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let sx = x - x0 as f64;
        let sy = y - y0 as f64;

        let top = cosine_interpolate(
            self.dot_corner(x0, y0, x, y),
            self.dot_corner(x0 + 1, y0, x, y),
            sx,
        );
        let bottom = cosine_interpolate(
            self.dot_corner(x0, y0 + 1, x, y),
            self.dot_corner(x0 + 1, y0 + 1, x, y),
            sx,
        );
        cosine_interpolate(top, bottom, sy)
    }
}

impl NoiseFn<f64, 2> for GradientLattice {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

/// Blend `a` → `b` with the cosine ease `(1 - cos(πt)) / 2`.
#[inline]
pub fn cosine_interpolate(a: f64, b: f64, t: f64) -> f64 {
    let f = (1.0 - (t * PI).cos()) * 0.5;
    a * (1.0 - f) + b * f
}
