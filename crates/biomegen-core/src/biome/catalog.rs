//! Static biome display registry: hex colour, RGB, name and a text glyph.

use super::Biome;

pub const UNKNOWN_COLOR: &str = "#FFFFFF";
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub biome: Biome,
    pub color: &'static str,
    pub rgb: [u8; 3],
    pub name: &'static str,
    pub glyph: char,
}

const ENTRIES: [CatalogEntry; Biome::COUNT] = [
    CatalogEntry { biome: Biome::DeepOcean,      color: "#000066", rgb: [0, 0, 102],     name: "Deep Ocean",      glyph: '~' },
    CatalogEntry { biome: Biome::Coast,          color: "#3399ff", rgb: [51, 153, 255],  name: "Coast",           glyph: '-' },
    CatalogEntry { biome: Biome::Beach,          color: "#ffcc99", rgb: [255, 204, 153], name: "Sand",            glyph: '.' },
    CatalogEntry { biome: Biome::Plains,         color: "#99cc66", rgb: [153, 204, 102], name: "Plains",          glyph: '"' },
    CatalogEntry { biome: Biome::Forest,         color: "#006600", rgb: [0, 102, 0],     name: "Forest",          glyph: 'T' },
    CatalogEntry { biome: Biome::Mountains,      color: "#666666", rgb: [102, 102, 102], name: "Mountains",       glyph: '^' },
    CatalogEntry { biome: Biome::SnowyMountains, color: "#ffffff", rgb: [255, 255, 255], name: "Snowy Mountains", glyph: 'A' },
];

/// Read-only lookups for renderers and exporters.
pub struct BiomeCatalog;

impl BiomeCatalog {
    pub fn entries() -> &'static [CatalogEntry] {
        &ENTRIES
    }

    pub fn entry(biome: Biome) -> &'static CatalogEntry {
        &ENTRIES[biome.id() as usize]
    }

    pub fn color(biome: Biome) -> &'static str {
        Self::entry(biome).color
    }

    pub fn name(biome: Biome) -> &'static str {
        Self::entry(biome).name
    }

    /// Colour for a stored biome id; [`UNKNOWN_COLOR`] for ids outside the set.
    pub fn color_by_id(id: u8) -> &'static str {
        Biome::from_id(id).map_or(UNKNOWN_COLOR, Self::color)
    }

    /// Name for a stored biome id; [`UNKNOWN_NAME`] for ids outside the set.
    pub fn name_by_id(id: u8) -> &'static str {
        Biome::from_id(id).map_or(UNKNOWN_NAME, Self::name)
    }

    pub fn rgb_by_id(id: u8) -> [u8; 3] {
        Biome::from_id(id).map_or([255, 255, 255], |b| Self::entry(b).rgb)
    }
}
