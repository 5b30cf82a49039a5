use serde::{Deserialize, Serialize};

/// Smallest scale used when a caller passes a non-positive (or NaN) scale.
pub const MIN_SCALE: f64 = 0.0001;

/// Octave layering parameters for one noise field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Cells per lattice unit at the first octave. Larger = smoother.
    pub scale: f64,
    pub octaves: u32,
    /// Per-octave amplitude decay.
    pub persistence: f64,
    /// Per-octave frequency growth.
    pub lacunarity: f64,
}

impl NoiseParams {
    pub fn new(scale: f64, octaves: u32, persistence: f64, lacunarity: f64) -> Self {
        Self { scale, octaves, persistence, lacunarity }
    }

    /// Scale with degenerate input replaced by [`MIN_SCALE`].
    pub fn effective_scale(&self) -> f64 {
        if self.scale > 0.0 { self.scale } else { MIN_SCALE }
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self { scale: 8.0, octaves: 4, persistence: 0.5, lacunarity: 2.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_scale_falls_back_to_epsilon() {
        for scale in [0.0, -3.0, f64::NAN] {
            let p = NoiseParams { scale, ..NoiseParams::default() };
            assert_eq!(p.effective_scale(), MIN_SCALE);
        }
        assert_eq!(NoiseParams::default().effective_scale(), 8.0);
    }
}
