//! Trainable direction classifiers used by the learned strategies.
//!
//! A predictor is fit once on a feature matrix with binary labels
//! (1 = next close higher) and then maps feature rows to {0, 1}.

pub mod forest;
pub mod logistic;
pub mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use logistic::LogisticRegression;
pub use tree::{DecisionTree, TreeConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("predictor '{0}' has not been fitted")]
    NotFitted(String),

    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("label {0} is not 0 or 1")]
    InvalidLabel(u8),
}

/// Binary classifier over dense feature rows.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    /// Fit on `x` (rows × features) with labels in {0, 1}.
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), PredictorError>;

    /// Predict a label in {0, 1} per row.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>, PredictorError>;

    fn is_fitted(&self) -> bool;
}

/// Validate a training set and return its feature width.
pub(crate) fn check_training_set(x: &[Vec<f64>], y: &[u8]) -> Result<usize, PredictorError> {
    if x.len() != y.len() {
        return Err(PredictorError::LengthMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    let width = x.first().map(Vec::len).ok_or(PredictorError::EmptyTrainingSet)?;
    check_width(x, width)?;
    if let Some(&bad) = y.iter().find(|&&label| label > 1) {
        return Err(PredictorError::InvalidLabel(bad));
    }
    Ok(width)
}

/// Every row must have `width` features.
pub(crate) fn check_width(x: &[Vec<f64>], width: usize) -> Result<(), PredictorError> {
    match x.iter().find(|row| row.len() != width) {
        Some(row) => Err(PredictorError::ShapeMismatch {
            expected: width,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

/// 2x2 confusion matrix for labels in {0, 1}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => (self.true_positive + self.true_negative) as f64 / n as f64,
        }
    }

    /// Share of predicted 1s that were right; 0 when nothing was predicted 1.
    pub fn precision(&self) -> f64 {
        match self.true_positive + self.false_positive {
            0 => 0.0,
            n => self.true_positive as f64 / n as f64,
        }
    }

    /// Share of actual 1s that were found; 0 when there were none.
    pub fn recall(&self) -> f64 {
        match self.true_positive + self.false_negative {
            0 => 0.0,
            n => self.true_positive as f64 / n as f64,
        }
    }
}

/// Tally predictions against truth. Pairs beyond the shorter slice are ignored.
pub fn confusion_matrix(y_true: &[u8], y_pred: &[u8]) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t, p) {
            (0, 0) => cm.true_negative += 1,
            (0, _) => cm.false_positive += 1,
            (_, 0) => cm.false_negative += 1,
            _ => cm.true_positive += 1,
        }
    }
    cm
}

/// Fraction of matching labels; 0 for empty input.
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    confusion_matrix(y_true, y_pred).accuracy()
}

#[cfg(test)]
pub(crate) fn separable_dataset(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
    // label is 1 exactly when the first feature is positive
    let x: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let a = (i as f64 * 0.37).sin() * 2.0;
            let b = (i as f64 * 0.11).cos();
            vec![a, b]
        })
        .collect();
    let y = x.iter().map(|row| u8::from(row[0] > 0.0)).collect();
    (x, y)
}
