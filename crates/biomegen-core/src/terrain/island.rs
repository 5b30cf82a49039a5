//! Radial island falloff: raise the centre, sink the rim.

use crate::grid::Grid;

pub const ISLAND_STRENGTH: f64 = 0.7;

/// Distance below which cells are raised rather than lowered.
const RAISE_RADIUS: f64 = 0.7;

/// Normalised distance of `(row, col)` from the grid centre, each axis
/// mapped to `[-1, 1]` independently.
pub fn radial_distance(row: usize, col: usize, width: usize, height: usize) -> f64 {
    let dx = (col as f64 / width as f64 - 0.5) * 2.0;
    let dy = (row as f64 / height as f64 - 0.5) * 2.0;
    (dx * dx + dy * dy).sqrt()
}

/// Bias elevation toward one central land mass.
pub fn apply_island_falloff(terrain: &Grid<f64>, strength: f64) -> Grid<f64> {
    let (w, h) = (terrain.width, terrain.height);
    Grid::from_fn(w, h, |r, c| {
        let v = terrain.get(r, c);
        let d = radial_distance(r, c, w, h);
        if d < RAISE_RADIUS {
            v + (1.0 - d) * strength * 0.3
        } else {
            v - ((1.0 - d) * strength).abs() * 0.5
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn centre_is_raised_and_corners_lowered() {
        let flat = Grid::new(20, 20, 0.0);
        let out = apply_island_falloff(&flat, ISLAND_STRENGTH);
        // Row/col 10 of 20 is the exact centre (d = 0).
        assert_abs_diff_eq!(out.get(10, 10), 0.21, epsilon = 1e-12);
        assert!(out.get(0, 0) < 0.0);
        assert!(out.get(10, 10) > out.get(10, 2));
    }

    #[test]
    fn distance_is_zero_at_centre_and_sqrt2_at_origin() {
        assert_abs_diff_eq!(radial_distance(5, 5, 10, 10), 0.0);
        assert_abs_diff_eq!(radial_distance(0, 0, 10, 10), std::f64::consts::SQRT_2, epsilon = 1e-12);
    }
}
