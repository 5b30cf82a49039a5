//! Climate synthesis: moisture and temperature fields in `[0, 1]`.
//!
//! Both fields come from their own noise seeds (`seed + 1000`,
//! `seed + 2000`), read the elevation grid for adjustment, and are min-max
//! normalised at the end. A flat field collapses to a constant 0.5.

pub mod moisture;
pub mod temperature;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::biome::BiomeAmounts;
use crate::error::{validate_dimensions, ConfigurationError};
use crate::grid::Grid;

use moisture::generate_moisture;
use temperature::generate_temperature;

/// Value used for every cell of a zero-variance climate field.
pub const FLAT_FIELD_VALUE: f64 = 0.5;

/// Outputs of the climate stage. Row-major, same shape as the elevation grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateLayer {
    pub moisture: Grid<f64>,
    pub temperature: Grid<f64>,
}

/// Stretch to `[0, 1]`, or collapse to [`FLAT_FIELD_VALUE`] when flat.
pub fn normalize_unit(mut field: Grid<f64>) -> Grid<f64> {
    if !field.stretch_to(0.0, 1.0) {
        field.data.fill(FLAT_FIELD_VALUE);
    }
    field
}

/// Derive moisture and temperature from elevation.
///
/// # Errors
/// [`ConfigurationError`] if the dimensions are invalid or the elevation grid
/// is not `width × height`.
pub fn generate_climate(
    elevation: &Grid<f64>,
    width: usize,
    height: usize,
    scale: f64,
    seed: i64,
    amounts: &BiomeAmounts,
) -> Result<ClimateLayer, ConfigurationError> {
    validate_dimensions(width, height)?;
    if elevation.width != width || elevation.height != height || elevation.len() != width * height {
        return Err(ConfigurationError::DimensionMismatch {
            width,
            height,
            actual_width: elevation.width,
            actual_height: elevation.height,
        });
    }

    let amounts = amounts.clamped();
    debug!("climate {width}x{height}: seed={seed} scale={scale}");

    let moisture = normalize_unit(generate_moisture(elevation, scale, seed, &amounts));
    let temperature = normalize_unit(generate_temperature(elevation, scale, seed, &amounts));

    Ok(ClimateLayer { moisture, temperature })
}
