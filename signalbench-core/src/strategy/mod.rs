//! Strategies turn a price series into a position target per bar.
//!
//! Rule-based strategies implement [`Strategy`] only. Learned strategies also
//! implement [`Trainable`] and refuse to produce signals until trained.
//!
//! # Alignment invariant
//! `generate_signals` returns exactly one value per input bar, on the input's
//! dates. The value at bar t may only depend on bars `0..=t`; the engine
//! applies it to the return from t to t+1.

pub mod classifier;
pub mod factory;
pub mod ma_crossover;
pub mod momentum;
pub mod rsi_reversion;
pub mod sequence;

pub use classifier::LearnedClassifier;
pub use factory::{
    create_strategy, ForestParams, LogisticParams, MaCrossoverParams, MomentumParams,
    RsiReversionParams, SequenceModel, SequenceParams, StrategyConfig,
};
pub use ma_crossover::MaCrossover;
pub use momentum::MomentumStrategy;
pub use rsi_reversion::RsiReversion;
pub use sequence::SequenceStrategy;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceSeries, SignalSeries, LONG, SHORT};
use crate::features::FeatureError;
use crate::predictor::PredictorError;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy '{0}' must be trained before generating signals")]
    NotTrained(String),

    #[error("insufficient data: need at least {needed} usable rows, got {actual}")]
    InsufficientData { needed: usize, actual: usize },

    #[error("invalid strategy config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

/// Produces a position-target series in {-1, 0, +1}.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Leading bars that are always flat.
    fn warmup_bars(&self) -> usize;

    fn generate_signals(&self, prices: &PriceSeries) -> Result<SignalSeries, StrategyError>;
}

/// A strategy that must be fit on history before use.
///
/// Untrained → (train) → Trained. Training again replaces the model.
pub trait Trainable: Strategy {
    fn train(&mut self, prices: &PriceSeries) -> Result<TrainingReport, StrategyError>;

    fn is_trained(&self) -> bool;
}

/// Sample counts and accuracies from one training call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub strategy: String,
    pub train_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: f64,
    /// `None` when the chronological split leaves no test rows.
    pub test_accuracy: Option<f64>,
}

/// A strategy built from config, trainable or not.
pub enum StrategyHandle {
    Rule(Box<dyn Strategy>),
    Learned(Box<dyn Trainable>),
}

impl StrategyHandle {
    pub fn name(&self) -> &str {
        match self {
            StrategyHandle::Rule(s) => s.name(),
            StrategyHandle::Learned(s) => s.name(),
        }
    }

    pub fn warmup_bars(&self) -> usize {
        match self {
            StrategyHandle::Rule(s) => s.warmup_bars(),
            StrategyHandle::Learned(s) => s.warmup_bars(),
        }
    }

    pub fn is_trainable(&self) -> bool {
        matches!(self, StrategyHandle::Learned(_))
    }

    /// True when signals can be generated now.
    pub fn is_ready(&self) -> bool {
        match self {
            StrategyHandle::Rule(_) => true,
            StrategyHandle::Learned(s) => s.is_trained(),
        }
    }

    pub fn generate_signals(&self, prices: &PriceSeries) -> Result<SignalSeries, StrategyError> {
        match self {
            StrategyHandle::Rule(s) => s.generate_signals(prices),
            StrategyHandle::Learned(s) => s.generate_signals(prices),
        }
    }

    /// Train a learned strategy; rule-based strategies have nothing to fit.
    pub fn train(&mut self, prices: &PriceSeries) -> Result<Option<TrainingReport>, StrategyError> {
        match self {
            StrategyHandle::Rule(_) => Ok(None),
            StrategyHandle::Learned(s) => s.train(prices).map(Some),
        }
    }
}

impl std::fmt::Debug for StrategyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_trainable() { "Learned" } else { "Rule" };
        f.debug_struct("StrategyHandle")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}

/// Binary next-bar direction per row: 1 if the next close is higher.
///
/// The last row has no next close and gets no label.
pub(crate) fn direction_labels(close: &[f64]) -> Vec<u8> {
    close.windows(2).map(|w| u8::from(w[1] > w[0])).collect()
}

/// Number of leading rows that go to the training side of a chronological split.
pub(crate) fn split_index(rows: usize, train_fraction: f64) -> usize {
    ((rows as f64 * train_fraction).floor() as usize).clamp(1, rows)
}

/// Map a predicted class to a position: 1 → long, 0 → short.
pub(crate) fn class_to_position(class: u8) -> f64 {
    if class == 1 {
        LONG
    } else {
        SHORT
    }
}
