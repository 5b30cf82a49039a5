//! One generation run: terrain, climate, then per-cell classification.
//!
//! A run either fails up front with a [`ConfigurationError`] (before any grid
//! is allocated) or returns a complete [`GeneratedMap`]. Nothing is published
//! half-built.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biome::{adjust::adjust_cell, Biome, BiomeAmounts, BiomeCatalog, BiomeThresholds, Preset};
use crate::classifier::{agreement_with_rules, Agreement, BiomeFeatures, ClassifierSlot, LearnedClassifier};
use crate::climate::generate_climate;
use crate::error::{validate_dimensions, ConfigurationError};
use crate::grid::Grid;
use crate::terrain::{generate_terrain, TerrainParams};

/// Upper bound for seeds drawn when the caller supplies none.
pub const MAX_DRAWN_SEED: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    pub roughness: f64,
    /// `None` draws a fresh seed; the drawn value is reported on the map.
    pub seed: Option<i64>,
    pub island_mode: bool,
    pub smooth_iterations: u32,
    pub amounts: BiomeAmounts,
    pub use_ml: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            width: 90,
            height: 60,
            scale: 10.0,
            roughness: 0.6,
            seed: None,
            island_mode: true,
            smooth_iterations: 2,
            amounts: BiomeAmounts::default(),
            use_ml: true,
        }
    }
}

impl GenerationParams {
    /// Cell count, or the reason the dimensions are unusable.
    pub fn validate(&self) -> Result<usize, ConfigurationError> {
        validate_dimensions(self.width, self.height)
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.amounts = preset.amounts();
        self
    }

    pub fn resolve_seed(&self) -> i64 {
        self.seed.unwrap_or_else(|| rand::thread_rng().gen_range(1..=MAX_DRAWN_SEED))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub total_cells: usize,
    pub ml_cells: usize,
    pub rule_cells: usize,
    pub ml_percent: f64,
    pub biome_counts: BTreeMap<Biome, usize>,
}

impl GenerationSummary {
    pub fn from_grids(biomes: &Grid<Biome>, ml_resolved: &Grid<bool>) -> Self {
        let total_cells = biomes.len();
        let ml_cells = ml_resolved.data.iter().filter(|&&ml| ml).count();
        let mut biome_counts: BTreeMap<Biome, usize> = Biome::ALL.iter().map(|&b| (b, 0)).collect();
        for &b in &biomes.data {
            *biome_counts.entry(b).or_default() += 1;
        }
        let ml_percent = if total_cells > 0 { ml_cells as f64 * 100.0 / total_cells as f64 } else { 0.0 };
        Self { total_cells, ml_cells, rule_cells: total_cells - ml_cells, ml_percent, biome_counts }
    }
}

/// Biome labels plus which cells the learned classifier decided.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub biomes: Grid<Biome>,
    pub ml_resolved: Grid<bool>,
}

/// Classify every cell of three same-shaped grids.
///
/// Each cell is slider-adjusted first. The learned classifier, when present,
/// is asked before the rules; a declined or failed prediction falls back to the
/// rules for that cell.
pub fn classify_grids(
    elevation: &Grid<f64>,
    moisture: &Grid<f64>,
    temperature: &Grid<f64>,
    amounts: &BiomeAmounts,
    model: Option<&dyn LearnedClassifier>,
) -> Result<Classification, ConfigurationError> {
    for other in [moisture, temperature] {
        if !elevation.same_shape(other) {
            return Err(ConfigurationError::DimensionMismatch {
                width: elevation.width,
                height: elevation.height,
                actual_width: other.width,
                actual_height: other.height,
            });
        }
    }

    let amounts = amounts.clamped();
    let thresholds = amounts.thresholds();
    let (width, height) = (elevation.width, elevation.height);
    let mut biomes = Vec::with_capacity(elevation.len());
    let mut ml_resolved = Vec::with_capacity(elevation.len());
    let mut failures = 0usize;
    let mut first_failure = None;

    for i in 0..elevation.len() {
        let cell = adjust_cell(elevation.data[i], moisture.data[i], temperature.data[i], &amounts);
        let features = BiomeFeatures::new(cell.elevation, cell.moisture, cell.temperature, thresholds);
        let learned = match model.map(|m| m.predict(&features)) {
            Some(Ok(found)) => found,
            Some(Err(e)) => {
                failures += 1;
                first_failure.get_or_insert(e);
                None
            }
            None => None,
        };
        ml_resolved.push(learned.is_some());
        biomes.push(learned.unwrap_or_else(|| features.rule_label()));
    }

    if let Some(e) = first_failure {
        warn!("learned classifier failed on {failures} cells, used rules instead (first error: {e})");
    }

    Ok(Classification {
        biomes: Grid::from_vec(width, height, biomes),
        ml_resolved: Grid::from_vec(width, height, ml_resolved),
    })
}

/// Everything one run produced. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMap {
    pub seed: i64,
    /// Parameters as used, with the resolved seed filled in.
    pub params: GenerationParams,
    pub thresholds: BiomeThresholds,
    pub elevation: Grid<f64>,
    pub moisture: Grid<f64>,
    pub temperature: Grid<f64>,
    pub biomes: Grid<Biome>,
    pub ml_resolved: Grid<bool>,
    pub summary: GenerationSummary,
}

impl GeneratedMap {
    pub fn width(&self) -> usize {
        self.biomes.width
    }

    pub fn height(&self) -> usize {
        self.biomes.height
    }

    pub fn biome_at(&self, row: usize, col: usize) -> Biome {
        self.biomes.get(row, col)
    }

    /// Classify the stored climate grids again with `amounts`.
    pub fn reclassify(
        &self,
        amounts: &BiomeAmounts,
        model: Option<&dyn LearnedClassifier>,
    ) -> Result<Classification, ConfigurationError> {
        classify_grids(&self.elevation, &self.moisture, &self.temperature, amounts, model)
    }

    /// How closely `model` tracks the rule engine on this map.
    pub fn agreement(&self, model: &dyn LearnedClassifier) -> Agreement {
        agreement_with_rules(model, &self.elevation, &self.moisture, &self.temperature, &self.params.amounts)
    }

    /// One glyph per cell, one line per row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * self.height());
        for row in self.biomes.data.chunks(self.width().max(1)) {
            out.extend(row.iter().map(|&b| BiomeCatalog::entry(b).glyph));
            out.push('\n');
        }
        out
    }
}

/// Runs generations against a shared classifier slot.
#[derive(Debug, Clone, Default)]
pub struct MapGenerator {
    classifier: ClassifierSlot,
}

impl MapGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: ClassifierSlot) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ClassifierSlot {
        &self.classifier
    }

    pub fn generate(&self, params: &GenerationParams) -> Result<GeneratedMap, ConfigurationError> {
        let cells = params.validate()?;
        let seed = params.resolve_seed();
        let amounts = params.amounts.clamped();
        let thresholds = amounts.thresholds();

        let model = if params.use_ml { self.classifier.snapshot() } else { None };
        match &model {
            Some(m) => debug!("classifying with {}", m.describe()),
            None if params.use_ml => debug!("no trained classifier, classifying with rules"),
            None => {}
        }

        let elevation = generate_terrain(&TerrainParams {
            width: params.width,
            height: params.height,
            scale: params.scale,
            roughness: params.roughness,
            seed,
            island_mode: params.island_mode,
            smooth_iterations: params.smooth_iterations,
            water_level: thresholds.water_level,
        })?;
        let climate = generate_climate(&elevation, params.width, params.height, params.scale, seed, &amounts)?;
        let Classification { biomes, ml_resolved } =
            classify_grids(&elevation, &climate.moisture, &climate.temperature, &amounts, model.as_deref())?;

        let summary = GenerationSummary::from_grids(&biomes, &ml_resolved);
        info!(
            "generated {}x{} map, seed {seed}: {cells} cells, {} by classifier ({:.1}%), {} by rules",
            params.width, params.height, summary.ml_cells, summary.ml_percent, summary.rule_cells
        );

        Ok(GeneratedMap {
            seed,
            params: GenerationParams { seed: Some(seed), amounts, ..params.clone() },
            thresholds,
            elevation,
            moisture: climate.moisture,
            temperature: climate.temperature,
            biomes,
            ml_resolved,
            summary,
        })
    }
}
