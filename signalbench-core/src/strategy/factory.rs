//! Factory: converts a [`StrategyConfig`] into a runtime strategy.
//!
//! Configs are serde-tagged by `type` so they read naturally from the
//! `[strategy]` table of a TOML run file. Every params struct fills missing
//! fields with the defaults the CLI uses.

use serde::{Deserialize, Serialize};

use super::{
    LearnedClassifier, MaCrossover, MomentumStrategy, RsiReversion, SequenceStrategy,
    StrategyError, StrategyHandle,
};
use crate::features::FeatureConfig;
use crate::predictor::{ForestConfig, LogisticRegression, RandomForest};

// ─── Params ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossoverParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MaCrossoverParams {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiReversionParams {
    pub period: usize,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

impl Default for RsiReversionParams {
    fn default() -> Self {
        Self {
            period: 14,
            buy_threshold: 30.0,
            sell_threshold: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub period: usize,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self { period: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tolerance: f64,
    pub train_fraction: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 1000,
            tolerance: 1e-6,
            train_fraction: 0.7,
        }
    }
}

impl LogisticParams {
    fn predictor(&self) -> LogisticRegression {
        LogisticRegression::new(self.learning_rate, self.max_iter, self.tolerance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
    pub train_fraction: f64,
}

impl Default for ForestParams {
    fn default() -> Self {
        let forest = ForestConfig::default();
        Self {
            n_trees: forest.n_trees,
            max_depth: forest.max_depth,
            min_samples_split: forest.min_samples_split,
            min_samples_leaf: forest.min_samples_leaf,
            max_features: forest.max_features,
            bootstrap: forest.bootstrap,
            seed: forest.seed,
            train_fraction: 0.7,
        }
    }
}

impl ForestParams {
    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            bootstrap: self.bootstrap,
            seed: self.seed,
        }
    }
}

/// Predictor behind the sequence strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceModel {
    #[default]
    Logistic,
    RandomForest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceParams {
    pub model: SequenceModel,
    pub window: usize,
    pub train_fraction: f64,
    /// Forest seed; unused by the logistic model.
    pub seed: u64,
}

impl Default for SequenceParams {
    fn default() -> Self {
        Self {
            model: SequenceModel::Logistic,
            window: 60,
            train_fraction: 0.8,
            seed: 42,
        }
    }
}

// ─── Config ──────────────────────────────────────────────────────────

/// Which strategy to run, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    SmaCrossover(MaCrossoverParams),
    RsiReversion(RsiReversionParams),
    Momentum(MomentumParams),
    Logistic(LogisticParams),
    RandomForest(ForestParams),
    Sequence(SequenceParams),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::SmaCrossover(MaCrossoverParams::default())
    }
}

impl StrategyConfig {
    /// Default config for a short command-line id.
    pub fn from_id(id: &str) -> Result<Self, StrategyError> {
        match id {
            "sma" => Ok(StrategyConfig::SmaCrossover(MaCrossoverParams::default())),
            "rsi" => Ok(StrategyConfig::RsiReversion(RsiReversionParams::default())),
            "momentum" => Ok(StrategyConfig::Momentum(MomentumParams::default())),
            "lr" => Ok(StrategyConfig::Logistic(LogisticParams::default())),
            "rf" => Ok(StrategyConfig::RandomForest(ForestParams::default())),
            "seq" => Ok(StrategyConfig::Sequence(SequenceParams::default())),
            other => Err(StrategyError::InvalidConfig(format!(
                "unknown strategy id '{other}' (expected sma, rsi, momentum, rf, lr or seq)"
            ))),
        }
    }

    /// Short command-line id.
    pub fn id(&self) -> &'static str {
        match self {
            StrategyConfig::SmaCrossover(_) => "sma",
            StrategyConfig::RsiReversion(_) => "rsi",
            StrategyConfig::Momentum(_) => "momentum",
            StrategyConfig::Logistic(_) => "lr",
            StrategyConfig::RandomForest(_) => "rf",
            StrategyConfig::Sequence(_) => "seq",
        }
    }

    /// Name reported by the built strategy.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::SmaCrossover(_) => "sma_crossover",
            StrategyConfig::RsiReversion(_) => "rsi_reversion",
            StrategyConfig::Momentum(_) => "momentum",
            StrategyConfig::Logistic(_) => "logistic",
            StrategyConfig::RandomForest(_) => "random_forest",
            StrategyConfig::Sequence(_) => "sequence",
        }
    }

    pub fn is_trainable(&self) -> bool {
        matches!(
            self,
            StrategyConfig::Logistic(_) | StrategyConfig::RandomForest(_) | StrategyConfig::Sequence(_)
        )
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        let invalid = |msg: &str| Err(StrategyError::InvalidConfig(msg.to_string()));
        let fraction_ok = |f: f64| f > 0.0 && f <= 1.0;
        match self {
            StrategyConfig::SmaCrossover(p) => {
                if p.short_window == 0 {
                    return invalid("short_window must be >= 1");
                }
                if p.long_window <= p.short_window {
                    return invalid("long_window must be > short_window");
                }
            }
            StrategyConfig::RsiReversion(p) => {
                if p.period == 0 {
                    return invalid("rsi period must be >= 1");
                }
                let finite = p.buy_threshold.is_finite() && p.sell_threshold.is_finite();
                if !finite || p.buy_threshold >= p.sell_threshold {
                    return invalid("buy_threshold must be below sell_threshold");
                }
            }
            StrategyConfig::Momentum(p) => {
                if p.period == 0 {
                    return invalid("momentum period must be >= 1");
                }
            }
            StrategyConfig::Logistic(p) => {
                if !(p.learning_rate > 0.0 && p.learning_rate.is_finite()) {
                    return invalid("learning_rate must be positive");
                }
                if !fraction_ok(p.train_fraction) {
                    return invalid("train_fraction must be in (0, 1]");
                }
            }
            StrategyConfig::RandomForest(p) => {
                if p.n_trees == 0 {
                    return invalid("n_trees must be >= 1");
                }
                if !fraction_ok(p.train_fraction) {
                    return invalid("train_fraction must be in (0, 1]");
                }
            }
            StrategyConfig::Sequence(p) => {
                if p.window == 0 {
                    return invalid("window must be >= 1");
                }
                if !fraction_ok(p.train_fraction) {
                    return invalid("train_fraction must be in (0, 1]");
                }
            }
        }
        Ok(())
    }
}

// ─── Factory ─────────────────────────────────────────────────────────

/// Build a strategy. Learned strategies come back untrained.
pub fn create_strategy(
    config: &StrategyConfig,
    features: &FeatureConfig,
) -> Result<StrategyHandle, StrategyError> {
    config.validate()?;
    features.validate()?;
    let name = config.name();
    let handle = match config {
        StrategyConfig::SmaCrossover(p) => {
            StrategyHandle::Rule(Box::new(MaCrossover::new(p.short_window, p.long_window)))
        }
        StrategyConfig::RsiReversion(p) => StrategyHandle::Rule(Box::new(RsiReversion::new(
            p.period,
            p.buy_threshold,
            p.sell_threshold,
        ))),
        StrategyConfig::Momentum(p) => {
            StrategyHandle::Rule(Box::new(MomentumStrategy::new(p.period)))
        }
        StrategyConfig::Logistic(p) => StrategyHandle::Learned(Box::new(LearnedClassifier::new(
            name,
            p.predictor(),
            features.clone(),
            p.train_fraction,
        ))),
        StrategyConfig::RandomForest(p) => {
            StrategyHandle::Learned(Box::new(LearnedClassifier::new(
                name,
                RandomForest::new(p.forest_config()),
                features.clone(),
                p.train_fraction,
            )))
        }
        StrategyConfig::Sequence(p) => match p.model {
            SequenceModel::Logistic => StrategyHandle::Learned(Box::new(SequenceStrategy::new(
                name,
                LogisticRegression::default(),
                features.clone(),
                p.window,
                p.train_fraction,
            ))),
            SequenceModel::RandomForest => {
                let forest = ForestConfig {
                    seed: p.seed,
                    ..ForestConfig::default()
                };
                StrategyHandle::Learned(Box::new(SequenceStrategy::new(
                    name,
                    RandomForest::new(forest),
                    features.clone(),
                    p.window,
                    p.train_fraction,
                )))
            }
        },
    };
    tracing::debug!(strategy = handle.name(), trainable = handle.is_trainable(), "strategy created");
    Ok(handle)
}
