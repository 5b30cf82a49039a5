use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing biome sliders, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeAmounts {
    /// More water → higher sea level.
    pub water: f64,
    /// More mountains → lower mountain line.
    pub mountain: f64,
    /// More desert → drier cutoff for sand.
    pub desert: f64,
    /// More forest → wetter cutoff for forest.
    pub forest: f64,
    /// 0 = cold, 1 = hot.
    pub temperature: f64,
}

impl Default for BiomeAmounts {
    fn default() -> Self {
        Self { water: 0.5, mountain: 0.5, desert: 0.3, forest: 0.6, temperature: 0.5 }
    }
}

impl BiomeAmounts {
    /// Every amount clamped to `[0, 1]`; NaN becomes 0.5.
    pub fn clamped(&self) -> Self {
        let c = |v: f64| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        Self {
            water: c(self.water),
            mountain: c(self.mountain),
            desert: c(self.desert),
            forest: c(self.forest),
            temperature: c(self.temperature),
        }
    }

    /// Classification cutoffs derived through fixed affine maps.
    pub fn thresholds(&self) -> BiomeThresholds {
        let a = self.clamped();
        BiomeThresholds {
            water_level: -0.8 + a.water * 0.7,
            mountain_level: 0.2 + a.mountain * 0.6,
            desert_moisture: 0.1 + a.desert * 0.4,
            forest_moisture: 0.4 + a.forest * 0.5,
            temperature_bias: a.temperature,
        }
    }
}

/// Cutoffs consumed by the rule engine and the learned classifier.
///
/// Valid ranges: water_level `[-0.8, 0.0]`, mountain_level `[0.2, 0.8]`,
/// desert_moisture `[0.1, 0.5]`, forest_moisture `[0.4, 0.9]`,
/// temperature_bias `[0, 1]`. The water slider only reaches `-0.1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiomeThresholds {
    pub water_level: f64,
    pub mountain_level: f64,
    pub desert_moisture: f64,
    pub forest_moisture: f64,
    pub temperature_bias: f64,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        BiomeAmounts::default().thresholds()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset `{0}` (expected one of: archipelago, desert, forests, mountains, continent, jungle)")]
pub struct PresetError(pub String);

/// Named slider combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Archipelago,
    Desert,
    Forests,
    Mountains,
    Continent,
    Jungle,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Archipelago,
        Preset::Desert,
        Preset::Forests,
        Preset::Mountains,
        Preset::Continent,
        Preset::Jungle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Archipelago => "archipelago",
            Preset::Desert      => "desert",
            Preset::Forests     => "forests",
            Preset::Mountains   => "mountains",
            Preset::Continent   => "continent",
            Preset::Jungle      => "jungle",
        }
    }

    pub fn amounts(self) -> BiomeAmounts {
        // (water, mountain, desert, forest, temperature)
        let (water, mountain, desert, forest, temperature) = match self {
            Preset::Archipelago => (0.9, 0.2, 0.1, 0.3, 0.6),
            Preset::Desert      => (0.1, 0.2, 0.9, 0.1, 0.8),
            Preset::Forests     => (0.3, 0.2, 0.1, 0.9, 0.5),
            Preset::Mountains   => (0.3, 0.9, 0.2, 0.3, 0.3),
            Preset::Continent   => (0.5, 0.5, 0.3, 0.6, 0.5),
            Preset::Jungle      => (0.6, 0.1, 0.1, 0.8, 0.8),
        };
        BiomeAmounts { water, mountain, desert, forest, temperature }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| PresetError(s.to_string()))
    }
}
