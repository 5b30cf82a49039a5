//! Fractional Brownian motion over a [`GradientLattice`].
//!
//! Octave `i` samples at frequency `lacunarity^i` with amplitude
//! `persistence^i`; the sum is divided by the total amplitude.
use ::noise::NoiseFn;

use super::gradient::GradientLattice;
use super::params::NoiseParams;

pub struct Fbm {
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    lattice: GradientLattice,
}

impl Fbm {
    pub fn new(seed: i64, params: &NoiseParams) -> Self {
        Self {
            octaves: params.octaves,
            persistence: params.persistence,
            lacunarity: params.lacunarity,
            lattice: GradientLattice::new(seed),
        }
    }

    /// Evaluate fBm at `(x, y)` in noise space.
    ///
    /// Returns `0.0` when `octaves == 0`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0f64;
        let mut total_amp = 0.0f64;
        let mut amp = 1.0f64;
        let mut freq = 1.0f64;
        for _ in 0..self.octaves {
            value += self.lattice.get([x * freq, y * freq]) * amp;
            total_amp += amp;
            amp *= self.persistence;
            freq *= self.lacunarity;
        }
        if total_amp > 0.0 {
            value /= total_amp;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_octaves_yield_zero() {
        let fbm = Fbm::new(1, &NoiseParams { octaves: 0, ..NoiseParams::default() });
        assert_eq!(fbm.sample(0.3, 0.7), 0.0);
    }

    #[test]
    fn output_bounded_by_single_octave_range() {
        // Each octave is a convex blend of corner dots, each bounded by √2.
        let fbm = Fbm::new(9, &NoiseParams::default());
        for i in 0..200 {
            let v = fbm.sample(i as f64 * 0.173, i as f64 * 0.091);
            assert!(v.abs() <= std::f64::consts::SQRT_2 + 1e-9, "sample {v} out of bounds");
        }
    }
}
