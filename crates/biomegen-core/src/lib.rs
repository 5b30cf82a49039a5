//! Deterministic terrain and biome map generation.
//!
//! Pipeline: gradient noise → elevation shaping → climate fields → biome
//! classification. Each stage consumes complete grids from the previous one;
//! nothing is recomputed incrementally.

pub mod biome;
pub mod classifier;
pub mod climate;
pub mod error;
pub mod generator;
pub mod grid;
pub mod noise;
pub mod terrain;

pub use biome::{Biome, BiomeAmounts, BiomeCatalog, BiomeThresholds, Preset};
pub use classifier::{ClassifierSlot, DecisionTree, LearnedClassifier, TrainingConfig, TrainingJob, TrainingReport};
pub use error::ConfigurationError;
pub use generator::{GeneratedMap, GenerationParams, GenerationSummary, MapGenerator};
pub use grid::Grid;
