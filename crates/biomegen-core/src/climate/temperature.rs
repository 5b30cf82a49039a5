//! Temperature field: noise blended with an equator-centred latitude band and
//! an elevation lapse, shifted by the temperature slider.

use crate::biome::BiomeAmounts;
use crate::grid::Grid;
use crate::noise::{generate_noise_field, params::NoiseParams};

pub const TEMPERATURE_SEED_OFFSET: i64 = 2000;

const NOISE_WEIGHT: f64 = 0.4;
const LATITUDE_WEIGHT: f64 = 0.5;
const HEIGHT_WEIGHT: f64 = 0.1;

pub fn temperature_noise_params(scale: f64) -> NoiseParams {
    NoiseParams { scale: scale * 0.5, octaves: 2, persistence: 0.4, lacunarity: 2.0 }
}

/// Warmth from latitude: 1 at the middle row, falling off toward the edges.
pub fn latitude_factor(row: usize, height: usize) -> f64 {
    (1.0 - (row as f64 / height as f64 - 0.5).abs() * 1.5).clamp(0.0, 1.0)
}

/// Cooling with altitude; only land above zero is affected.
pub fn height_factor(elevation: f64) -> f64 {
    1.0 - elevation.max(0.0) * 0.8
}

/// Global shift from the temperature slider, in `[-0.25, 0.25]`.
pub fn temperature_bias(amounts: &BiomeAmounts) -> f64 {
    (amounts.temperature - 0.5) * 0.5
}

/// Generate the clamped temperature field, before final normalisation.
pub fn generate_temperature(elevation: &Grid<f64>, scale: f64, seed: i64, amounts: &BiomeAmounts) -> Grid<f64> {
    let (w, h) = (elevation.width, elevation.height);
    let noise = generate_noise_field(
        w,
        h,
        &temperature_noise_params(scale),
        seed.wrapping_add(TEMPERATURE_SEED_OFFSET),
    );
    let bias = temperature_bias(amounts);

    Grid::from_fn(w, h, |r, c| {
        let base = noise.get(r, c) * NOISE_WEIGHT
            + latitude_factor(r, h) * LATITUDE_WEIGHT
            + height_factor(elevation.get(r, c)) * HEIGHT_WEIGHT;
        (base + bias).clamp(0.0, 1.0)
    })
}
