//! Single-pass coastline cleanup around the water level.
//!
//! Isolated water cells (fewer than 4 of 8 neighbours under water) are raised
//! to just above the water line; isolated land cells (more than 4 water
//! neighbours) are dropped to just above it. Reads the input grid only.

use crate::grid::Grid;

pub fn smooth_coastlines(src: &Grid<f64>, water_level: f64) -> Grid<f64> {
    let mut dst = src.clone();
    let (w, h) = (src.width, src.height);
    if w < 3 || h < 3 {
        return dst;
    }
    for r in 1..h - 1 {
        for c in 1..w - 1 {
            let current = src.get(r, c);
            let mut water_neighbors = 0;
            for nr in r - 1..=r + 1 {
                for nc in c - 1..=c + 1 {
                    if (nr, nc) != (r, c) && src.get(nr, nc) < water_level {
                        water_neighbors += 1;
                    }
                }
            }

            if current < water_level {
                if water_neighbors < 4 {
                    dst.set(r, c, (water_level + 0.1).max(current));
                }
            } else if water_neighbors > 4 {
                dst.set(r, c, (water_level + 0.05).min(current));
            }
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn water_speck_is_filled() {
        let mut g = Grid::new(3, 3, 0.5);
        g.set(1, 1, -0.9);
        let s = smooth_coastlines(&g, -0.3);
        assert_abs_diff_eq!(s.get(1, 1), -0.2, epsilon = 1e-12);
    }

    #[test]
    fn land_speck_is_lowered() {
        let mut g = Grid::new(3, 3, -0.9);
        g.set(1, 1, 0.6);
        let s = smooth_coastlines(&g, -0.3);
        assert_abs_diff_eq!(s.get(1, 1), -0.25, epsilon = 1e-12);
    }

    #[test]
    fn coherent_regions_are_kept() {
        // Left half water, right half land: no cell is isolated.
        let g = Grid::from_fn(6, 6, |_, c| if c < 3 { -0.8 } else { 0.4 });
        assert_eq!(smooth_coastlines(&g, -0.3), g);
    }

    #[test]
    fn border_cells_are_untouched() {
        let mut g = Grid::new(4, 4, -0.9);
        g.set(0, 0, 0.7);
        let s = smooth_coastlines(&g, -0.3);
        assert_eq!(s.get(0, 0), 0.7);
    }
}
