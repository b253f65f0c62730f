//! Serializable backtest configuration, read from TOML.
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! start_date = "2020-01-01"
//! end_date = "2023-01-01"
//! initial_capital = 10000.0
//! interval = "1d"
//!
//! [strategy]
//! type = "random_forest"
//! n_trees = 200
//!
//! [training]
//! start_date = "2010-01-01"
//! end_date = "2019-12-31"
//!
//! [features]
//! lags = 5
//!
//! [metrics]
//! risk_free_rate = 0.02
//! ```
//!
//! Every section except `[backtest]` may be omitted.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalbench_core::data::Interval;
use signalbench_core::features::{FeatureConfig, FeatureError};
use signalbench_core::strategy::{StrategyConfig, StrategyError};

use crate::metrics::MetricsConfig;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Complete configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub training: TrainingSection,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub metrics: MetricsSection,
}

/// What to test, over which dates, with how much capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default)]
    pub interval: Interval,
}

fn default_initial_capital() -> f64 {
    10_000.0
}

/// Annualisation settings; `periods_per_year` defaults to the bar interval's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    pub periods_per_year: Option<f64>,
    pub risk_free_rate: f64,
}

/// Date range used to fit learned strategies; ignored by rule strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSection {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Default for TrainingSection {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2019, 12, 31).unwrap_or_default(),
        }
    }
}

impl BacktestConfig {
    /// Config with default strategy, training, feature and metric sections.
    pub fn new(symbol: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            backtest: BacktestSection {
                symbol: symbol.into(),
                start_date,
                end_date,
                initial_capital: default_initial_capital(),
                interval: Interval::default(),
            },
            strategy: StrategyConfig::default(),
            training: TrainingSection::default(),
            features: FeatureConfig::default(),
            metrics: MetricsSection::default(),
        }
    }

    /// Metric settings with the periods per year resolved against the interval.
    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            periods_per_year: self
                .metrics
                .periods_per_year
                .unwrap_or_else(|| self.backtest.interval.periods_per_year()),
            risk_free_rate: self.metrics.risk_free_rate,
        }
    }

    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if bt.start_date > bt.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                bt.start_date, bt.end_date
            )));
        }
        if !(bt.initial_capital.is_finite() && bt.initial_capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {}",
                bt.initial_capital
            )));
        }
        if self.metrics_config().periods_per_year <= 0.0 {
            return Err(ConfigError::Invalid(
                "periods_per_year must be positive".into(),
            ));
        }
        self.strategy.validate()?;
        self.features.validate()?;

        if self.strategy.is_trainable() {
            let tr = &self.training;
            if tr.start_date > tr.end_date {
                return Err(ConfigError::Invalid(format!(
                    "training start_date {} is after end_date {}",
                    tr.start_date, tr.end_date
                )));
            }
            if self.training_overlaps() {
                tracing::warn!(
                    training_start = %tr.start_date,
                    training_end = %tr.end_date,
                    backtest_start = %bt.start_date,
                    backtest_end = %bt.end_date,
                    "training range overlaps the backtest range"
                );
            }
        }
        Ok(())
    }

    /// True when the training and backtest ranges share at least one day.
    pub fn training_overlaps(&self) -> bool {
        let (tr, bt) = (&self.training, &self.backtest);
        tr.start_date <= bt.end_date && tr.end_date >= bt.start_date
    }

    /// Deterministic hash of the full config.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
