//! Random forest of bootstrapped CART trees.
//!
//! Trees are fit in parallel. Each tree draws its bootstrap sample and its
//! split features from its own RNG, seeded from `(seed, tree index)` by
//! BLAKE3, so the fitted forest does not depend on thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeConfig};
use super::{check_training_set, check_width, Predictor, PredictorError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features searched per split; `None` uses ceil(sqrt(n_features)).
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        assert!(config.n_trees >= 1, "forest needs at least one tree");
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean leaf probability of label 1 across trees.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, PredictorError> {
        if self.trees.is_empty() {
            return Err(PredictorError::NotFitted(self.name().to_string()));
        }
        check_width(x, self.n_features)?;
        Ok(x
            .iter()
            .map(|row| {
                let sum: f64 = self
                    .trees
                    .iter()
                    .filter_map(|t| t.predict_proba_one(row))
                    .sum();
                sum / self.trees.len() as f64
            })
            .collect())
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

/// Seed for one tree, independent of the order trees are built in.
fn tree_seed(seed: u64, tree: usize) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(&(tree as u64).to_le_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

impl Predictor for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), PredictorError> {
        let n_features = check_training_set(x, y)?;
        let n = x.len();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize);
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
        };

        let config = &self.config;
        self.trees = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, i));
                let indices: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let mut tree = DecisionTree::new(tree_config.clone());
                tree.fit(x, y, &indices, &mut rng);
                tree
            })
            .collect();
        self.n_features = n_features;

        tracing::debug!(
            trees = self.trees.len(),
            samples = n,
            features = n_features,
            max_features,
            "random forest fit"
        );
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>, PredictorError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
