//! Multi-octave gradient noise fields normalised to `[0, 1]`.

pub mod fbm;
pub mod gradient;
pub mod params;

use crate::grid::Grid;
use fbm::Fbm;
use params::NoiseParams;

/// Generate a `width × height` noise field in `[0, 1]`.
///
/// Sample coordinates are `(col / scale, row / scale)` at the first octave.
/// The finished field is min-max stretched to `[0, 1]`; a flat field is only
/// clamped. A non-positive scale is replaced by [`params::MIN_SCALE`].
/// Empty dimensions yield an empty grid.
///
/// Pure: identical arguments give bit-identical output.
pub fn generate_noise_field(width: usize, height: usize, params: &NoiseParams, seed: i64) -> Grid<f64> {
    if width == 0 || height == 0 {
        return Grid { data: Vec::new(), width, height };
    }

    let scale = params.effective_scale();
    let fbm = Fbm::new(seed, params);

    let mut field = Grid::from_fn(width, height, |r, c| {
        fbm.sample(c as f64 / scale, r as f64 / scale)
    });

    if !field.stretch_to(0.0, 1.0) {
        field.clamp_all(0.0, 1.0);
    }
    field
}
