//! Biome labels, their display catalog, tunable thresholds and the rule
//! engine that maps per-cell climate to a biome.

pub mod adjust;
pub mod catalog;
pub mod rules;
pub mod thresholds;

use serde::{Deserialize, Serialize};

pub use catalog::BiomeCatalog;
pub use rules::classify;
pub use thresholds::{BiomeAmounts, BiomeThresholds, Preset, PresetError};

/// Closed set of biome labels. `id()` is stable and used for storage/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    DeepOcean = 0,
    Coast = 1,
    Beach = 2,
    Plains = 3,
    Forest = 4,
    Mountains = 5,
    SnowyMountains = 6,
}

impl Biome {
    pub const ALL: [Biome; 7] = [
        Biome::DeepOcean,
        Biome::Coast,
        Biome::Beach,
        Biome::Plains,
        Biome::Forest,
        Biome::Mountains,
        Biome::SnowyMountains,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Biome> {
        Self::ALL.get(id as usize).copied()
    }

    /// Water biomes: deep ocean and coast.
    pub fn is_water(self) -> bool {
        matches!(self, Biome::DeepOcean | Biome::Coast)
    }

    pub fn color(self) -> &'static str {
        BiomeCatalog::entry(self).color
    }

    pub fn name(self) -> &'static str {
        BiomeCatalog::entry(self).name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for b in Biome::ALL {
            assert_eq!(Biome::from_id(b.id()), Some(b));
        }
        assert_eq!(Biome::from_id(7), None);
    }

    #[test]
    fn serde_uses_snake_case_labels() {
        let s = serde_json::to_string(&Biome::SnowyMountains).unwrap();
        assert_eq!(s, "\"snowy_mountains\"");
        let b: Biome = serde_json::from_str("\"deep_ocean\"").unwrap();
        assert_eq!(b, Biome::DeepOcean);
    }
}
