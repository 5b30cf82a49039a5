//! Optional learned biome classifier.
//!
//! A learned classifier sees the same seven numbers the rule engine does
//! (three cell values plus four thresholds) and may decline to answer. It is
//! trained on labels produced by [`crate::biome::classify`], so it can at best
//! reproduce the rules; it is never an independent ground truth.
//!
//! Models live in a [`ClassifierSlot`]. Training installs a finished model with
//! a single swap; a generation run takes a [`ClassifierSlot::snapshot`] at its
//! start and keeps using it even if a newer model is installed mid-run.

pub mod training;
pub mod tree;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biome::{adjust::adjust_cell, classify, Biome, BiomeAmounts, BiomeThresholds};
use crate::grid::Grid;

pub use training::{
    load_or_train, CancelToken, ClassMetrics, ModelSource, TrainedModel, TrainingConfig, TrainingError, TrainingJob,
    TrainingReport,
};
pub use tree::{DecisionTree, ModelError, TreeConfig};

pub const FEATURE_COUNT: usize = 7;

/// Where the trainer writes, and the CLI looks for, the model by default.
pub const DEFAULT_MODEL_PATH: &str = "models/biome_model.json";

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "elevation",
    "moisture",
    "temperature",
    "water_level",
    "mountain_level",
    "desert_moisture",
    "forest_moisture",
];

/// Classifier input for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiomeFeatures {
    pub elevation: f64,
    pub moisture: f64,
    pub temperature: f64,
    pub thresholds: BiomeThresholds,
}

impl BiomeFeatures {
    pub fn new(elevation: f64, moisture: f64, temperature: f64, thresholds: BiomeThresholds) -> Self {
        Self { elevation, moisture, temperature, thresholds }
    }

    /// Feature vector in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.elevation,
            self.moisture,
            self.temperature,
            self.thresholds.water_level,
            self.thresholds.mountain_level,
            self.thresholds.desert_moisture,
            self.thresholds.forest_moisture,
        ]
    }

    /// Label from the rule engine for the same inputs.
    pub fn rule_label(&self) -> Biome {
        classify(self.elevation, self.moisture, self.temperature, &self.thresholds)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("malformed model: {0}")]
    MalformedModel(String),

    #[error("feature {0} is not finite")]
    NonFiniteFeature(usize),
}

/// Anything that can stand in front of the rule engine.
pub trait LearnedClassifier: Send + Sync {
    /// `Ok(None)` declines the cell; the rule engine then decides.
    fn predict(&self, features: &BiomeFeatures) -> Result<Option<Biome>, ClassifierError>;

    /// Short label for logs.
    fn describe(&self) -> String {
        "learned classifier".to_string()
    }
}

/// Shared, swappable handle to the current model (or none).
#[derive(Clone, Default)]
pub struct ClassifierSlot {
    inner: Arc<RwLock<Option<Arc<dyn LearnedClassifier>>>>,
}

impl ClassifierSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: Arc<dyn LearnedClassifier>) -> Self {
        let slot = Self::new();
        slot.install(model);
        slot
    }

    /// Replace the current model. Runs already in flight keep their snapshot.
    pub fn install(&self, model: Arc<dyn LearnedClassifier>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn snapshot(&self) -> Option<Arc<dyn LearnedClassifier>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_trained(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

impl fmt::Debug for ClassifierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierSlot").field("trained", &self.is_trained()).finish()
    }
}

/// How often a learned classifier matches the rule engine on a map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Agreement {
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Compare `model` against the rule engine over stored map grids, using the
/// same slider adjustment generation applies. Declined or failed cells count
/// as disagreements.
pub fn agreement_with_rules(
    model: &dyn LearnedClassifier,
    elevation: &Grid<f64>,
    moisture: &Grid<f64>,
    temperature: &Grid<f64>,
    amounts: &BiomeAmounts,
) -> Agreement {
    let amounts = amounts.clamped();
    let thresholds = amounts.thresholds();
    let total = elevation.len().min(moisture.len()).min(temperature.len());
    let correct = (0..total)
        .filter(|&i| {
            let cell = adjust_cell(elevation.data[i], moisture.data[i], temperature.data[i], &amounts);
            let features = BiomeFeatures::new(cell.elevation, cell.moisture, cell.temperature, thresholds);
            matches!(model.predict(&features), Ok(Some(b)) if b == features.rule_label())
        })
        .count();
    let accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };
    Agreement { correct, total, accuracy }
}
