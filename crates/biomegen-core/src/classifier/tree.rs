//! CART decision tree over the seven classifier features.
//!
//! Splits minimise weighted Gini impurity. The fitted tree is a flat node
//! array so it serialises to plain JSON and can be walked without recursion.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::training::{CancelToken, TrainingError};
use super::{BiomeFeatures, ClassifierError, LearnedClassifier, FEATURE_COUNT};
use crate::biome::Biome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { max_depth: 15, min_samples_split: 5, min_samples_leaf: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// `probabilities` are training class frequencies at the leaf, by biome id.
    Leaf { biome: Biome, probabilities: [f64; Biome::COUNT] },
    /// `feature <= threshold` goes left.
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("model is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model has no nodes")]
    Empty,
}

impl Node {
    /// Leaf that is certain of one biome.
    pub fn leaf(biome: Biome) -> Self {
        let mut probabilities = [0.0; Biome::COUNT];
        probabilities[biome.id() as usize] = 1.0;
        Node::Leaf { biome, probabilities }
    }

    fn leaf_from_counts(counts: &[usize; Biome::COUNT]) -> Self {
        let biome = majority(counts);
        let total: usize = counts.iter().sum();
        if total == 0 {
            return Self::leaf(biome);
        }
        Node::Leaf { biome, probabilities: counts.map(|c| c as f64 / total as f64) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    depth: usize,
    /// Normalised total Gini decrease per feature; all zero for a single leaf.
    #[serde(default)]
    feature_importances: [f64; FEATURE_COUNT],
}

impl DecisionTree {
    /// Fit a tree to `samples`/`labels`. Checks `cancel` once per node.
    pub fn fit(
        samples: &[[f64; FEATURE_COUNT]],
        labels: &[Biome],
        config: &TreeConfig,
        cancel: &CancelToken,
    ) -> Result<Self, TrainingError> {
        if samples.is_empty() || samples.len() != labels.len() {
            return Err(TrainingError::EmptyDataset);
        }
        let mut builder = Builder {
            x: samples,
            y: labels,
            config,
            cancel,
            nodes: Vec::new(),
            depth: 0,
            gains: [0.0; FEATURE_COUNT],
        };
        let mut idx: Vec<usize> = (0..samples.len()).collect();
        builder.build(&mut idx, 0)?;

        let total: f64 = builder.gains.iter().sum();
        let feature_importances =
            if total > 0.0 { builder.gains.map(|g| g / total) } else { [0.0; FEATURE_COUNT] };
        Ok(Self { nodes: builder.nodes, depth: builder.depth, feature_importances })
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, ModelError> {
        if nodes.is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(Self { nodes, depth: 0, feature_importances: [0.0; FEATURE_COUNT] })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Indexed by feature, in `FEATURE_NAMES` order. Sums to 1 for any tree
    /// with at least one split.
    pub fn feature_importances(&self) -> &[f64; FEATURE_COUNT] {
        &self.feature_importances
    }

    pub fn predict_array(&self, x: &[f64; FEATURE_COUNT]) -> Result<Biome, ClassifierError> {
        self.leaf_for(x).map(|(biome, _)| biome)
    }

    /// Class probabilities by biome id, taken from the leaf `features` reach.
    pub fn predict_proba(&self, features: &BiomeFeatures) -> Result<[f64; Biome::COUNT], ClassifierError> {
        let x = finite_features(features)?;
        self.leaf_for(&x).map(|(_, probabilities)| *probabilities)
    }

    /// Walk the tree. Out-of-range indices and cycles are reported, not followed.
    fn leaf_for(&self, x: &[f64; FEATURE_COUNT]) -> Result<(Biome, &[f64; Biome::COUNT]), ClassifierError> {
        let mut id = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(id) {
                None => {
                    return Err(ClassifierError::MalformedModel(format!("node {id} out of range")));
                }
                Some(Node::Leaf { biome, probabilities }) => return Ok((*biome, probabilities)),
                Some(&Node::Split { feature, threshold, left, right }) => {
                    let v = *x.get(feature).ok_or_else(|| {
                        ClassifierError::MalformedModel(format!("feature index {feature} out of range"))
                    })?;
                    id = if v <= threshold { left } else { right };
                }
            }
        }
        Err(ClassifierError::MalformedModel("cycle in node graph".to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let tree: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        if tree.nodes.is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(tree)
    }
}

impl LearnedClassifier for DecisionTree {
    fn predict(&self, features: &BiomeFeatures) -> Result<Option<Biome>, ClassifierError> {
        self.predict_array(&finite_features(features)?).map(Some)
    }

    fn describe(&self) -> String {
        format!("decision tree ({} nodes, depth {})", self.nodes.len(), self.depth)
    }
}

fn finite_features(features: &BiomeFeatures) -> Result<[f64; FEATURE_COUNT], ClassifierError> {
    let x = features.to_array();
    match x.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ClassifierError::NonFiniteFeature(i)),
        None => Ok(x),
    }
}

struct Builder<'a> {
    x: &'a [[f64; FEATURE_COUNT]],
    y: &'a [Biome],
    config: &'a TreeConfig,
    cancel: &'a CancelToken,
    nodes: Vec<Node>,
    depth: usize,
    gains: [f64; FEATURE_COUNT],
}

struct Split {
    feature: usize,
    threshold: f64,
    /// Weighted Gini decrease, in samples.
    gain: f64,
}

impl Builder<'_> {
    fn build(&mut self, idx: &mut [usize], depth: usize) -> Result<usize, TrainingError> {
        if self.cancel.is_cancelled() {
            return Err(TrainingError::Cancelled);
        }
        self.depth = self.depth.max(depth);

        let counts = self.class_counts(idx);
        let node_id = self.nodes.len();
        self.nodes.push(Node::leaf_from_counts(&counts));

        let classes = counts.iter().filter(|&&c| c > 0).count();
        if classes <= 1 || depth >= self.config.max_depth || idx.len() < self.config.min_samples_split {
            return Ok(node_id);
        }
        let Some(Split { feature, threshold, gain }) = self.best_split(idx, &counts) else {
            return Ok(node_id);
        };
        self.gains[feature] += gain;

        let mut mid = 0;
        for k in 0..idx.len() {
            if self.x[idx[k]][feature] <= threshold {
                idx.swap(k, mid);
                mid += 1;
            }
        }
        let (l, r) = idx.split_at_mut(mid);
        let left = self.build(l, depth + 1)?;
        let right = self.build(r, depth + 1)?;
        self.nodes[node_id] = Node::Split { feature, threshold, left, right };
        Ok(node_id)
    }

    fn class_counts(&self, idx: &[usize]) -> [usize; Biome::COUNT] {
        let mut counts = [0; Biome::COUNT];
        for &i in idx {
            counts[self.y[i].id() as usize] += 1;
        }
        counts
    }

    // Maximises sum(n_k^2)/n over both sides, which is equivalent to
    // minimising weighted Gini impurity.
    fn best_split(&self, idx: &[usize], counts: &[usize; Biome::COUNT]) -> Option<Split> {
        let n = idx.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_sq: usize = counts.iter().map(|c| c * c).sum();
        let parent_score = parent_sq as f64 / n as f64;
        let mut best_score = parent_score + 1e-12;
        let mut best = None;
        let mut order = idx.to_vec();

        for f in 0..FEATURE_COUNT {
            order.sort_by(|&a, &b| self.x[a][f].total_cmp(&self.x[b][f]));
            let mut left = [0usize; Biome::COUNT];
            let mut right = *counts;
            let mut sq_left = 0usize;
            let mut sq_right = parent_sq;

            for k in 0..n - 1 {
                let c = self.y[order[k]].id() as usize;
                sq_left += 2 * left[c] + 1;
                left[c] += 1;
                sq_right -= 2 * right[c] - 1;
                right[c] -= 1;

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let v = self.x[order[k]][f];
                let next = self.x[order[k + 1]][f];
                if next <= v {
                    continue;
                }
                let score = sq_left as f64 / n_left as f64 + sq_right as f64 / n_right as f64;
                if score > best_score {
                    best_score = score;
                    let mid = v + (next - v) * 0.5;
                    best = Some(Split {
                        feature: f,
                        threshold: if mid < next { mid } else { v },
                        gain: score - parent_score,
                    });
                }
            }
        }
        best
    }
}

/// Most frequent class; ties go to the lowest id.
fn majority(counts: &[usize; Biome::COUNT]) -> Biome {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    Biome::ALL[best]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeThresholds;
    use approx::assert_abs_diff_eq;

    fn stump() -> DecisionTree {
        DecisionTree::from_nodes(vec![
            Node::Split { feature: 0, threshold: 0.0, left: 1, right: 2 },
            Node::leaf(Biome::DeepOcean),
            Node::leaf(Biome::Plains),
        ])
        .unwrap()
    }

    fn features(elevation: f64) -> BiomeFeatures {
        BiomeFeatures::new(elevation, 0.5, 0.5, BiomeThresholds::default())
    }

    #[test]
    fn stump_routes_on_threshold() {
        let tree = stump();
        assert_eq!(tree.predict(&features(-0.5)), Ok(Some(Biome::DeepOcean)));
        assert_eq!(tree.predict(&features(0.0)), Ok(Some(Biome::DeepOcean)));
        assert_eq!(tree.predict(&features(0.5)), Ok(Some(Biome::Plains)));
    }

    #[test]
    fn malformed_trees_are_errors() {
        let dangling = DecisionTree::from_nodes(vec![Node::Split { feature: 0, threshold: 0.0, left: 5, right: 6 }])
            .unwrap();
        assert!(matches!(dangling.predict(&features(0.0)), Err(ClassifierError::MalformedModel(_))));

        let bad_feature = DecisionTree::from_nodes(vec![
            Node::Split { feature: 9, threshold: 0.0, left: 1, right: 1 },
            Node::leaf(Biome::Forest),
        ])
        .unwrap();
        assert!(matches!(bad_feature.predict(&features(0.0)), Err(ClassifierError::MalformedModel(_))));

        let cycle =
            DecisionTree::from_nodes(vec![Node::Split { feature: 0, threshold: 0.0, left: 0, right: 0 }]).unwrap();
        assert!(matches!(cycle.predict(&features(0.0)), Err(ClassifierError::MalformedModel(_))));

        assert!(matches!(DecisionTree::from_nodes(Vec::new()), Err(ModelError::Empty)));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        assert_eq!(stump().predict(&features(f64::NAN)), Err(ClassifierError::NonFiniteFeature(0)));
    }

    #[test]
    fn fit_separates_one_dimensional_classes() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let v = i as f64 / 40.0;
            x.push([v, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
            y.push(if v < 0.5 { Biome::Coast } else { Biome::Forest });
        }
        let tree = DecisionTree::fit(&x, &y, &TreeConfig::default(), &CancelToken::new()).unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.depth(), 1);
        for (xi, yi) in x.iter().zip(&y) {
            assert_eq!(tree.predict_array(xi).unwrap(), *yi);
        }
        assert_eq!(tree.feature_importances()[0], 1.0);
        assert!(tree.feature_importances()[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn leaf_probabilities_are_distributions() {
        let x: Vec<_> = (0..64).map(|i| [i as f64, (i % 5) as f64, 0.0, 0.0, 0.0, 0.0, 0.0]).collect();
        let y: Vec<_> = (0..64).map(|i| Biome::ALL[i % Biome::COUNT]).collect();
        let config = TreeConfig { max_depth: 3, ..TreeConfig::default() };
        let tree = DecisionTree::fit(&x, &y, &config, &CancelToken::new()).unwrap();

        let mut leaves = 0;
        for node in tree.nodes() {
            if let Node::Leaf { biome, probabilities } = node {
                leaves += 1;
                assert_abs_diff_eq!(probabilities.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
                let top = probabilities.iter().cloned().fold(0.0, f64::max);
                assert_eq!(probabilities[biome.id() as usize], top);
            }
        }
        assert!(leaves > 1);
        assert_abs_diff_eq!(tree.feature_importances().iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn proba_follows_the_same_path_as_predict() {
        let tree = stump();
        let p = tree.predict_proba(&features(0.5)).unwrap();
        assert_eq!(p[Biome::Plains.id() as usize], 1.0);
        assert_eq!(p.iter().sum::<f64>(), 1.0);
        assert_eq!(tree.predict_proba(&features(f64::INFINITY)), Err(ClassifierError::NonFiniteFeature(0)));
        assert_eq!(tree.feature_importances(), &[0.0; FEATURE_COUNT]);
    }

    #[test]
    fn fit_respects_depth_limit() {
        let x: Vec<_> = (0..64).map(|i| [i as f64, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).collect();
        let y: Vec<_> = (0..64).map(|i| Biome::ALL[i % Biome::COUNT]).collect();
        let config = TreeConfig { max_depth: 3, ..TreeConfig::default() };
        let tree = DecisionTree::fit(&x, &y, &config, &CancelToken::new()).unwrap();
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn fit_rejects_empty_and_cancelled() {
        let config = TreeConfig::default();
        assert!(matches!(
            DecisionTree::fit(&[], &[], &config, &CancelToken::new()),
            Err(TrainingError::EmptyDataset)
        ));

        let token = CancelToken::new();
        token.cancel();
        let x = [[0.0; FEATURE_COUNT]];
        assert!(matches!(DecisionTree::fit(&x, &[Biome::Coast], &config, &token), Err(TrainingError::Cancelled)));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let tree = stump();
        tree.save(&path).unwrap();
        assert_eq!(DecisionTree::load(&path).unwrap(), tree);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(DecisionTree::load(&path), Err(ModelError::Json(_))));
        assert!(matches!(DecisionTree::load(dir.path().join("missing.json")), Err(ModelError::Io(_))));
    }
}
