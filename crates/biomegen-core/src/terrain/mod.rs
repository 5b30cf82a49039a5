//! Elevation synthesis: noise → island falloff → smoothing → normalisation →
//! coastline cleanup. Output lies in `[-1, 1]`.

pub mod coastline;
pub mod island;
pub mod smoothing;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{validate_dimensions, ConfigurationError};
use crate::grid::Grid;
use crate::noise::{generate_noise_field, params::NoiseParams};

/// Fixed frequency growth between terrain octaves.
pub const TERRAIN_LACUNARITY: f64 = 2.0;

/// Inputs for one elevation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    /// 0 = smooth rolling terrain, 1 = jagged. Drives octaves and persistence.
    pub roughness: f64,
    pub seed: i64,
    pub island_mode: bool,
    pub smooth_iterations: u32,
    /// Sea level used by the coastline pass.
    pub water_level: f64,
}

/// Map roughness to the octave stack: `clamp(round(r * 6), 1, 6)` octaves,
/// persistence `0.4 + r * 0.3`.
pub fn roughness_noise_params(scale: f64, roughness: f64) -> NoiseParams {
    let r = if roughness.is_nan() { 0.0 } else { roughness.clamp(0.0, 1.0) };
    let octaves = ((r * 6.0).round() as u32).clamp(1, 6);
    NoiseParams {
        scale,
        octaves,
        persistence: 0.4 + r * 0.3,
        lacunarity: TERRAIN_LACUNARITY,
    }
}

/// Generate a normalised elevation grid.
///
/// # Errors
/// [`ConfigurationError`] if the dimensions are zero or overflow.
pub fn generate_terrain(params: &TerrainParams) -> Result<Grid<f64>, ConfigurationError> {
    validate_dimensions(params.width, params.height)?;

    let noise_params = roughness_noise_params(params.scale, params.roughness);
    debug!(
        "terrain {}x{}: seed={} octaves={} persistence={:.3}",
        params.width, params.height, params.seed, noise_params.octaves, noise_params.persistence
    );

    let noise = generate_noise_field(params.width, params.height, &noise_params, params.seed);
    let mut terrain = noise.map(|&v| v * 2.0 - 1.0);

    if params.island_mode {
        terrain = island::apply_island_falloff(&terrain, island::ISLAND_STRENGTH);
    }

    terrain = smoothing::smooth(terrain, params.smooth_iterations);

    if !terrain.stretch_to(-1.0, 1.0) {
        terrain.clamp_all(-1.0, 1.0);
    }

    Ok(coastline::smooth_coastlines(&terrain, params.water_level))
}
