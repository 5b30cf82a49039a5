//! Per-run slider nudges applied to each cell before classification.
//!
//! The rule table itself is fixed; these band-limited nudges are what make the
//! water/mountain/desert/forest/temperature sliders visibly shift biome
//! proportions. Results are clamped to the classifier's input domain.

use super::BiomeAmounts;

/// Classifier inputs for one cell after slider adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedCell {
    pub elevation: f64,
    pub moisture: f64,
    pub temperature: f64,
}

const HIGH: f64 = 0.7;
const LOW: f64 = 0.3;

pub fn adjust_cell(elevation: f64, moisture: f64, temperature: f64, amounts: &BiomeAmounts) -> AdjustedCell {
    let mut e = elevation;
    let mut m = moisture;
    let mut t = temperature;

    // Bands are selected on the unadjusted elevation.
    if elevation < -0.1 {
        if amounts.water > HIGH {
            e -= 0.15;
        } else if amounts.water < LOW {
            e += 0.15;
        }
    }

    if elevation > 0.2 {
        if amounts.mountain > HIGH {
            e += 0.15;
        } else if amounts.mountain < LOW {
            e -= 0.15;
        }
    }

    if elevation < 0.3 {
        if amounts.desert > HIGH {
            m *= 0.6;
            t = (t * 1.2).min(1.0);
        } else if amounts.desert < LOW {
            m = (m * 1.3).min(1.0);
        }
    }

    if 0.1 < elevation && elevation < 0.5 {
        if amounts.forest > HIGH {
            m = (m * 1.3).min(1.0);
        } else if amounts.forest < LOW {
            m *= 0.7;
        }
    }

    t += (amounts.temperature - 0.5) * 0.3;

    AdjustedCell {
        elevation: e.clamp(-1.0, 1.0),
        moisture: m.clamp(0.0, 1.0),
        temperature: t.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn neutral() -> BiomeAmounts {
        BiomeAmounts { water: 0.5, mountain: 0.5, desert: 0.5, forest: 0.5, temperature: 0.5 }
    }

    #[test]
    fn neutral_amounts_change_nothing() {
        let c = adjust_cell(0.25, 0.4, 0.6, &neutral());
        assert_eq!(c, AdjustedCell { elevation: 0.25, moisture: 0.4, temperature: 0.6 });
    }

    #[test]
    fn water_slider_moves_low_ground() {
        let wet = BiomeAmounts { water: 0.9, ..neutral() };
        let dry = BiomeAmounts { water: 0.1, ..neutral() };
        assert_abs_diff_eq!(adjust_cell(-0.3, 0.5, 0.5, &wet).elevation, -0.45, epsilon = 1e-12);
        assert_abs_diff_eq!(adjust_cell(-0.3, 0.5, 0.5, &dry).elevation, -0.15, epsilon = 1e-12);
        // Above the band: untouched.
        assert_eq!(adjust_cell(0.0, 0.5, 0.5, &wet).elevation, 0.0);
    }

    #[test]
    fn mountain_slider_moves_high_ground() {
        let high = BiomeAmounts { mountain: 0.9, ..neutral() };
        assert_abs_diff_eq!(adjust_cell(0.5, 0.5, 0.5, &high).elevation, 0.65, epsilon = 1e-12);
        // Clamped to the top of the domain.
        assert_eq!(adjust_cell(0.95, 0.5, 0.5, &high).elevation, 1.0);
    }

    #[test]
    fn desert_slider_dries_and_heats_lowlands() {
        let desert = BiomeAmounts { desert: 0.9, ..neutral() };
        let c = adjust_cell(0.0, 0.5, 0.9, &desert);
        assert_abs_diff_eq!(c.moisture, 0.3, epsilon = 1e-12);
        assert_eq!(c.temperature, 1.0);
    }

    #[test]
    fn forest_slider_wets_midlands() {
        let forest = BiomeAmounts { forest: 0.9, ..neutral() };
        assert_abs_diff_eq!(adjust_cell(0.2, 0.5, 0.5, &forest).moisture, 0.65, epsilon = 1e-12);
        let sparse = BiomeAmounts { forest: 0.1, ..neutral() };
        assert_abs_diff_eq!(adjust_cell(0.2, 0.5, 0.5, &sparse).moisture, 0.35, epsilon = 1e-12);
    }

    #[test]
    fn temperature_slider_shifts_and_clamps() {
        let hot = BiomeAmounts { temperature: 1.0, ..neutral() };
        let cold = BiomeAmounts { temperature: 0.0, ..neutral() };
        assert_abs_diff_eq!(adjust_cell(0.0, 0.5, 0.5, &hot).temperature, 0.65, epsilon = 1e-12);
        assert_eq!(adjust_cell(0.0, 0.5, 0.1, &cold).temperature, 0.0);
    }
}
