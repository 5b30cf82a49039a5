//! Rule-based biome classification.
//!
//! Bands are tested in order and the first match wins:
//!   water (`< water_level`) → coast (`+0.15`) → beach (`+0.25`) →
//!   lowland (`< 0.1`) → midland (`< 0.3`) → highland (`< mountain_level`) → peak.
//!
//! Jungle, desert and hill variants of older tables are folded into Forest,
//! Beach and Plains respectively.

use super::{Biome, BiomeThresholds};

/// Classify one cell. Total over all inputs, NaN included.
pub fn classify(elevation: f64, moisture: f64, temperature: f64, t: &BiomeThresholds) -> Biome {
    if elevation < t.water_level {
        return Biome::DeepOcean;
    }
    if elevation < t.water_level + 0.15 {
        return Biome::Coast;
    }
    if elevation < t.water_level + 0.25 {
        return Biome::Beach;
    }

    if elevation < 0.1 {
        lowland(moisture, temperature, t)
    } else if elevation < 0.3 {
        midland(moisture, temperature, t)
    } else if elevation < t.mountain_level {
        highland(elevation, temperature, t)
    } else if temperature < 0.5 {
        Biome::SnowyMountains
    } else {
        Biome::Mountains
    }
}

fn lowland(moisture: f64, temperature: f64, t: &BiomeThresholds) -> Biome {
    if moisture > 0.65 {
        Biome::Forest
    } else if moisture < t.desert_moisture {
        if temperature > 0.7 { Biome::Beach } else { Biome::Plains }
    } else if temperature > 0.8 && moisture > 0.5 {
        Biome::Forest
    } else {
        Biome::Plains
    }
}

fn midland(moisture: f64, temperature: f64, t: &BiomeThresholds) -> Biome {
    if moisture > t.forest_moisture {
        Biome::Forest
    } else if moisture > t.desert_moisture + 0.1 {
        Biome::Plains
    } else if moisture < t.desert_moisture && temperature > 0.6 {
        Biome::Beach
    } else {
        Biome::Plains
    }
}

fn highland(elevation: f64, temperature: f64, t: &BiomeThresholds) -> Biome {
    if temperature < 0.4 {
        // Cold slopes just under the mountain line carry snow.
        if elevation > t.mountain_level - 0.1 { Biome::SnowyMountains } else { Biome::Mountains }
    } else if temperature < 0.6 {
        if elevation > t.mountain_level - 0.15 { Biome::Mountains } else { Biome::Plains }
    } else {
        Biome::Mountains
    }
}
