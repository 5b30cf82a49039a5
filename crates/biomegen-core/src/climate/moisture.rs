//! Moisture field: low-frequency noise nudged by the forest and desert sliders.

use crate::biome::BiomeAmounts;
use crate::grid::Grid;
use crate::noise::{generate_noise_field, params::NoiseParams};

pub const MOISTURE_SEED_OFFSET: i64 = 1000;

pub fn moisture_noise_params(scale: f64) -> NoiseParams {
    NoiseParams { scale: scale * 0.7, octaves: 3, persistence: 0.5, lacunarity: 2.0 }
}

/// Slider nudge for one cell's raw moisture, given its elevation.
pub fn adjust_moisture(moisture: f64, elevation: f64, amounts: &BiomeAmounts) -> f64 {
    let mut m = moisture;

    if 0.1 < elevation && elevation < 0.4 {
        if amounts.forest > 0.7 {
            m = (m * 1.3).min(1.0);
        } else if amounts.forest < 0.3 {
            m = (m * 0.7).max(0.0);
        }
    }

    if elevation < 0.2 {
        if amounts.desert > 0.7 {
            m = (m * 0.5).max(0.0);
        } else if amounts.desert < 0.3 {
            m = (m * 1.2).min(1.0);
        }
    }

    m
}

/// Generate the adjusted moisture field, before final normalisation.
pub fn generate_moisture(elevation: &Grid<f64>, scale: f64, seed: i64, amounts: &BiomeAmounts) -> Grid<f64> {
    let noise = generate_noise_field(
        elevation.width,
        elevation.height,
        &moisture_noise_params(scale),
        seed.wrapping_add(MOISTURE_SEED_OFFSET),
    );
    Grid::from_fn(elevation.width, elevation.height, |r, c| {
        adjust_moisture(noise.get(r, c), elevation.get(r, c), amounts)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn neutral() -> BiomeAmounts {
        BiomeAmounts { water: 0.5, mountain: 0.5, desert: 0.5, forest: 0.5, temperature: 0.5 }
    }

    #[test]
    fn neutral_sliders_leave_moisture_alone() {
        for e in [-0.9, 0.0, 0.15, 0.3, 0.9] {
            assert_eq!(adjust_moisture(0.42, e, &neutral()), 0.42);
        }
    }

    #[test]
    fn forest_slider_only_touches_midlands() {
        let lush = BiomeAmounts { forest: 0.9, ..neutral() };
        assert_abs_diff_eq!(adjust_moisture(0.5, 0.3, &lush), 0.65, epsilon = 1e-12);
        assert_eq!(adjust_moisture(0.9, 0.3, &lush), 1.0);
        assert_eq!(adjust_moisture(0.5, 0.6, &lush), 0.5);
    }

    #[test]
    fn desert_slider_only_touches_low_ground() {
        let arid = BiomeAmounts { desert: 0.9, ..neutral() };
        assert_abs_diff_eq!(adjust_moisture(0.5, 0.0, &arid), 0.25, epsilon = 1e-12);
        assert_eq!(adjust_moisture(0.5, 0.5, &arid), 0.5);
        let humid = BiomeAmounts { desert: 0.1, ..neutral() };
        assert_abs_diff_eq!(adjust_moisture(0.5, 0.0, &humid), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn uses_offset_seed() {
        let elevation = Grid::new(16, 16, 0.9);
        let m = generate_moisture(&elevation, 8.0, 5, &neutral());
        let direct = generate_noise_field(16, 16, &moisture_noise_params(8.0), 1005);
        assert_eq!(m, direct);
    }
}
