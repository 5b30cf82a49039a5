//! Training a decision tree on rule-engine labels.
//!
//! Samples are drawn uniformly over the classifier's input domain: each cell
//! value and each threshold across its valid range. Labels come from
//! [`crate::biome::classify`].

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tree::{DecisionTree, ModelError, TreeConfig};
use super::{BiomeFeatures, ClassifierSlot, LearnedClassifier, FEATURE_COUNT};
use crate::biome::{Biome, BiomeThresholds};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("training was cancelled")]
    Cancelled,

    #[error("training dataset is empty")]
    EmptyDataset,

    #[error("training worker panicked")]
    WorkerPanicked,

    #[error("could not start training worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub samples: usize,
    pub seed: u64,
    /// Share of samples held out for the test accuracy figure.
    pub test_fraction: f64,
    pub tree: TreeConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { samples: 50_000, seed: 42, test_fraction: 0.2, tree: TreeConfig::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub nodes: usize,
    pub depth: usize,
    pub elapsed_ms: u128,
    /// Normalised Gini importance per feature, in `FEATURE_NAMES` order.
    pub feature_importances: [f64; FEATURE_COUNT],
    /// Held-out precision and recall for every biome.
    pub per_class: Vec<ClassMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub biome: Biome,
    pub precision: f64,
    pub recall: f64,
    /// Held-out samples labelled with this biome.
    pub support: usize,
}

/// Cooperative cancellation flag shared with a training worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Dataset {
    pub samples: Vec<[f64; FEATURE_COUNT]>,
    pub labels: Vec<Biome>,
}

const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Draw `count` labelled samples. Same seed, same dataset.
pub fn generate_dataset(count: usize, seed: u64, cancel: &CancelToken) -> Result<Dataset, TrainingError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(count);
    let mut labels = Vec::with_capacity(count);
    for n in 0..count {
        if n % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(TrainingError::Cancelled);
        }
        let elevation = rng.gen_range(-1.0..=1.0);
        let moisture = rng.gen();
        let temperature = rng.gen();
        let thresholds = BiomeThresholds {
            water_level: rng.gen_range(-0.8..0.0),
            mountain_level: rng.gen_range(0.2..0.8),
            desert_moisture: rng.gen_range(0.1..0.5),
            forest_moisture: rng.gen_range(0.4..0.9),
            temperature_bias: 0.5,
        };
        let features = BiomeFeatures::new(elevation, moisture, temperature, thresholds);
        samples.push(features.to_array());
        labels.push(features.rule_label());
    }
    Ok(Dataset { samples, labels })
}

/// Generate data, fit, and score on a held-out split.
pub fn train(config: &TrainingConfig, cancel: &CancelToken) -> Result<(DecisionTree, TrainingReport), TrainingError> {
    let started = Instant::now();
    let data = generate_dataset(config.samples, config.seed, cancel)?;
    if data.samples.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let mut order: Vec<usize> = (0..data.samples.len()).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1)));
    let test_len = ((order.len() as f64) * config.test_fraction.clamp(0.0, 0.9)).round() as usize;
    let (test_idx, train_idx) = order.split_at(test_len);

    let pick = |idx: &[usize]| -> (Vec<[f64; FEATURE_COUNT]>, Vec<Biome>) {
        idx.iter().map(|&i| (data.samples[i], data.labels[i])).unzip()
    };
    let (train_x, train_y) = pick(train_idx);
    let (test_x, test_y) = pick(test_idx);

    let tree = DecisionTree::fit(&train_x, &train_y, &config.tree, cancel)?;
    let report = TrainingReport {
        train_samples: train_x.len(),
        test_samples: test_x.len(),
        train_accuracy: accuracy(&tree, &train_x, &train_y),
        test_accuracy: accuracy(&tree, &test_x, &test_y),
        nodes: tree.node_count(),
        depth: tree.depth(),
        elapsed_ms: started.elapsed().as_millis(),
        feature_importances: *tree.feature_importances(),
        per_class: class_metrics(&tree, &test_x, &test_y),
    };
    info!(
        "trained {} on {} samples: train {:.3}, test {:.3}",
        tree.describe(),
        report.train_samples,
        report.train_accuracy,
        report.test_accuracy
    );
    Ok((tree, report))
}

fn accuracy(tree: &DecisionTree, x: &[[f64; FEATURE_COUNT]], y: &[Biome]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let correct = x.iter().zip(y).filter(|(xi, yi)| tree.predict_array(xi).ok() == Some(**yi)).count();
    correct as f64 / x.len() as f64
}

fn class_metrics(tree: &DecisionTree, x: &[[f64; FEATURE_COUNT]], y: &[Biome]) -> Vec<ClassMetrics> {
    let mut hits = [0usize; Biome::COUNT];
    let mut predicted = [0usize; Biome::COUNT];
    let mut actual = [0usize; Biome::COUNT];
    for (xi, &yi) in x.iter().zip(y) {
        actual[yi.id() as usize] += 1;
        if let Ok(p) = tree.predict_array(xi) {
            predicted[p.id() as usize] += 1;
            if p == yi {
                hits[p.id() as usize] += 1;
            }
        }
    }
    let ratio = |a: usize, b: usize| if b == 0 { 0.0 } else { a as f64 / b as f64 };
    Biome::ALL
        .iter()
        .map(|&biome| {
            let i = biome.id() as usize;
            ClassMetrics {
                biome,
                precision: ratio(hits[i], predicted[i]),
                recall: ratio(hits[i], actual[i]),
                support: actual[i],
            }
        })
        .collect()
}

/// Where [`load_or_train`] got its model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    Loaded,
    Trained(TrainingReport),
}

/// Install the model saved at `path`, or train one with `config`, save it
/// there and install that. Runs on the calling thread.
pub fn load_or_train(
    path: &Path,
    config: &TrainingConfig,
    slot: &ClassifierSlot,
) -> Result<ModelSource, TrainingError> {
    if path.exists() {
        let tree = DecisionTree::load(path)?;
        info!("loaded model from {}: {} nodes, depth {}", path.display(), tree.node_count(), tree.depth());
        slot.install(Arc::new(tree));
        return Ok(ModelSource::Loaded);
    }

    info!("no model at {}, training one", path.display());
    let (tree, report) = train(config, &CancelToken::new())?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(ModelError::from)?;
    }
    tree.save(path)?;
    slot.install(Arc::new(tree));
    Ok(ModelSource::Trained(report))
}

/// A finished model and how it scored.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub tree: Arc<DecisionTree>,
    pub report: TrainingReport,
    /// A cancel arrived after the model was already installed and was ignored.
    pub late_cancel: bool,
}

/// Install a finished tree unless the job was cancelled first.
///
/// Cancellation is a request, not a lock: a cancel landing after the final
/// check is too late, the model stays installed and `late_cancel` is set.
fn publish(
    slot: &ClassifierSlot,
    tree: DecisionTree,
    report: TrainingReport,
    token: &CancelToken,
) -> Result<TrainedModel, TrainingError> {
    if token.is_cancelled() {
        return Err(TrainingError::Cancelled);
    }
    let tree = Arc::new(tree);
    slot.install(tree.clone());
    let late_cancel = token.is_cancelled();
    if late_cancel {
        warn!("training cancelled after the model was installed; keeping it");
    }
    Ok(TrainedModel { tree, report, late_cancel })
}

/// Background training that installs into a slot only on success.
///
/// The slot keeps whatever model it had until the new tree is complete, so a
/// cancelled or failed run never leaves it half-updated.
pub struct TrainingJob {
    handle: JoinHandle<Result<TrainedModel, TrainingError>>,
    cancel: CancelToken,
}

impl TrainingJob {
    pub fn spawn(slot: ClassifierSlot, config: TrainingConfig) -> Result<Self, TrainingError> {
        Self::spawn_with_token(slot, config, CancelToken::new())
    }

    pub fn spawn_with_token(
        slot: ClassifierSlot,
        config: TrainingConfig,
        cancel: CancelToken,
    ) -> Result<Self, TrainingError> {
        let token = cancel.clone();
        let handle = thread::Builder::new().name("biome-trainer".to_string()).spawn(move || {
            let (tree, report) = train(&config, &token)?;
            publish(&slot, tree, report, &token)
        })?;
        Ok(Self { handle, cancel })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<TrainedModel, TrainingError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                warn!("training worker panicked");
                Err(TrainingError::WorkerPanicked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn small() -> TrainingConfig {
        TrainingConfig { samples: 4000, ..TrainingConfig::default() }
    }

    #[test]
    fn dataset_is_deterministic_and_in_domain() {
        let a = generate_dataset(200, 7, &CancelToken::new()).unwrap();
        let b = generate_dataset(200, 7, &CancelToken::new()).unwrap();
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.labels, b.labels);
        for s in &a.samples {
            assert!((-1.0..=1.0).contains(&s[0]));
            assert!((0.0..1.0).contains(&s[1]));
            assert!((0.0..1.0).contains(&s[2]));
        }
    }

    #[test]
    fn thresholds_cover_their_full_ranges() {
        let data = generate_dataset(500, 3, &CancelToken::new()).unwrap();
        for s in &data.samples {
            assert!((-0.8..0.0).contains(&s[3]));
            assert!((0.2..0.8).contains(&s[4]));
            assert!((0.1..0.5).contains(&s[5]));
            assert!((0.4..0.9).contains(&s[6]));
        }
        // Water levels above the highest slider setting are still sampled.
        assert!(data.samples.iter().any(|s| s[3] > -0.1));
    }

    #[test]
    fn report_carries_importances_and_per_class_scores() {
        let (_, report) = train(&small(), &CancelToken::new()).unwrap();
        assert_abs_diff_eq!(report.feature_importances.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(report.feature_importances.iter().all(|&v| v >= 0.0));
        // Elevation drives every band, so it must matter.
        assert!(report.feature_importances[0] > 0.1);

        assert_eq!(report.per_class.len(), Biome::COUNT);
        assert_eq!(report.per_class.iter().map(|c| c.support).sum::<usize>(), report.test_samples);
        for c in &report.per_class {
            assert!((0.0..=1.0).contains(&c.precision), "{c:?}");
            assert!((0.0..=1.0).contains(&c.recall), "{c:?}");
        }
        let recalled: f64 = report.per_class.iter().map(|c| c.recall * c.support as f64).sum();
        assert_abs_diff_eq!(recalled / report.test_samples as f64, report.test_accuracy, epsilon = 1e-9);
    }

    #[test]
    fn publish_respects_an_earlier_cancel() {
        let tree = || DecisionTree::from_nodes(vec![crate::classifier::tree::Node::leaf(Biome::Forest)]).unwrap();
        let (_, report) = train(&TrainingConfig { samples: 50, ..small() }, &CancelToken::new()).unwrap();

        let slot = ClassifierSlot::new();
        let done = publish(&slot, tree(), report.clone(), &CancelToken::new()).unwrap();
        assert!(!done.late_cancel);
        assert!(slot.is_trained());

        let empty = ClassifierSlot::new();
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(publish(&empty, tree(), report, &token), Err(TrainingError::Cancelled)));
        assert!(!empty.is_trained());
    }

    #[test]
    fn load_or_train_trains_once_then_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("biome_model.json");
        let config = TrainingConfig { samples: 500, ..TrainingConfig::default() };

        let slot = ClassifierSlot::new();
        let first = load_or_train(&path, &config, &slot).unwrap();
        assert!(matches!(first, ModelSource::Trained(_)));
        assert!(path.exists());
        assert!(slot.is_trained());

        let again = ClassifierSlot::new();
        assert_eq!(load_or_train(&path, &config, &again).unwrap(), ModelSource::Loaded);
        assert!(again.is_trained());

        std::fs::write(&path, "[]").unwrap();
        let broken = ClassifierSlot::new();
        assert!(matches!(
            load_or_train(&path, &config, &broken),
            Err(TrainingError::Model(ModelError::Json(_)))
        ));
        assert!(!broken.is_trained());
    }

    #[test]
    fn small_run_learns_the_rules() {
        let (tree, report) = train(&small(), &CancelToken::new()).unwrap();
        assert_eq!(report.train_samples + report.test_samples, 4000);
        assert_eq!(report.test_samples, 800);
        assert!(report.train_accuracy > 0.85, "train accuracy {}", report.train_accuracy);
        assert!(report.test_accuracy > 0.6, "test accuracy {}", report.test_accuracy);
        assert!(report.depth <= 15);
        assert_eq!(report.nodes, tree.node_count());
    }

    #[test]
    fn zero_samples_is_an_error() {
        let config = TrainingConfig { samples: 0, ..TrainingConfig::default() };
        assert!(matches!(train(&config, &CancelToken::new()), Err(TrainingError::EmptyDataset)));
    }

    #[test]
    fn job_installs_on_success() {
        let slot = ClassifierSlot::new();
        let trained = TrainingJob::spawn(slot.clone(), small()).unwrap().join().unwrap();
        assert!(trained.report.train_accuracy > 0.85);
        let installed = slot.snapshot().unwrap();
        let f = BiomeFeatures::new(0.0, 0.5, 0.5, BiomeThresholds::default());
        assert_eq!(installed.predict(&f), trained.tree.predict(&f));
    }

    #[test]
    fn cancelled_job_keeps_previous_model() {
        let previous: Arc<dyn LearnedClassifier> = Arc::new(
            DecisionTree::from_nodes(vec![crate::classifier::tree::Node::leaf(Biome::Plains)]).unwrap(),
        );
        let slot = ClassifierSlot::with_model(previous.clone());

        let token = CancelToken::new();
        token.cancel();
        let result = TrainingJob::spawn_with_token(slot.clone(), small(), token).unwrap().join();
        assert!(matches!(result, Err(TrainingError::Cancelled)));
        assert!(Arc::ptr_eq(&slot.snapshot().unwrap(), &previous));
    }
}
