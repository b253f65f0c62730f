//! CART classification tree with Gini impurity.
//!
//! Splits are `x[feature] <= threshold` with thresholds at midpoints between
//! consecutive distinct values. At each node a random subset of
//! `max_features` features is searched. Leaves hold the fraction of label-1
//! samples that reached them.

use rand::rngs::StdRng;
use rand::seq::index::sample;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features searched per split; `None` searches all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        prob: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<Node>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self { config, root: None }
    }

    /// Fit on the rows of `x` listed in `indices` (repeats allowed, for bootstrap samples).
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[u8], indices: &[usize], rng: &mut StdRng) {
        self.root = Some(self.build(x, y, indices, 0, rng));
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Probability of label 1, or `None` before fitting.
    pub fn predict_proba_one(&self, row: &[f64]) -> Option<f64> {
        let mut node = self.root.as_ref()?;
        loop {
            match node {
                Node::Leaf { prob } => return Some(*prob),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    fn build(
        &self,
        x: &[Vec<f64>],
        y: &[u8],
        indices: &[usize],
        depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        let positives = indices.iter().filter(|&&i| y[i] == 1).count();
        let prob = positives as f64 / indices.len().max(1) as f64;

        let pure = positives == 0 || positives == indices.len();
        if pure || depth >= self.config.max_depth || indices.len() < self.config.min_samples_split
        {
            return Node::Leaf { prob };
        }

        let Some(best) = self.best_split(x, y, indices, rng) else {
            return Node::Leaf { prob };
        };
        let parent_score = gini(positives, indices.len()) * indices.len() as f64;
        if best.score >= parent_score - 1e-12 {
            return Node::Leaf { prob };
        }

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[i][best.feature] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(x, y, &left, depth + 1, rng)),
            right: Box::new(self.build(x, y, &right, depth + 1, rng)),
        }
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[u8],
        indices: &[usize],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n_features = x[indices[0]].len();
        let k = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);
        let features = sample(rng, n_features, k).into_vec();

        let min_leaf = self.config.min_samples_leaf.max(1);
        let n = indices.len();
        let total_pos = indices.iter().filter(|&&i| y[i] == 1).count();
        let mut best: Option<BestSplit> = None;

        for feature in features {
            let mut sorted: Vec<(f64, u8)> = indices.iter().map(|&i| (x[i][feature], y[i])).collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0;
            for split in 1..n {
                left_pos += usize::from(sorted[split - 1].1);
                if sorted[split - 1].0 == sorted[split].0 {
                    continue;
                }
                let (left_n, right_n) = (split, n - split);
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let score = gini(left_pos, left_n) * left_n as f64
                    + gini(total_pos - left_pos, right_n) * right_n as f64;
                if best.as_ref().map_or(true, |b| score < b.score) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (sorted[split - 1].0 + sorted[split].0) / 2.0,
                        score,
                    });
                }
            }
        }
        best
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}
