//! Backtest runner — wires data, strategy, simulation and metrics together.
//!
//! Entry points:
//! - [`BacktestEngine`]: owns a provider and one strategy; `train` then `run`.
//! - [`run_from_config`]: one complete run described by a [`BacktestConfig`].
//! - [`run_many`]: the same config over several symbols, in parallel.

use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;

use signalbench_core::data::{load_prices, DataError, DataProvider, Interval};
use signalbench_core::engine::{simulate, EngineError};
use signalbench_core::features::FeatureConfig;
use signalbench_core::strategy::{
    create_strategy, StrategyConfig, StrategyError, StrategyHandle, TrainingReport,
};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::metrics::{MetricsConfig, PerformanceMetrics};
use crate::result::{BacktestResult, SCHEMA_VERSION};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("simulation error: {0}")]
    Engine(#[from] EngineError),
}

/// One data provider, one strategy instance, one capital/metrics setup.
///
/// Learned strategies must be trained with [`BacktestEngine::train`] before
/// [`BacktestEngine::run`]; running an untrained one fails with `NotTrained`.
pub struct BacktestEngine {
    provider: Arc<dyn DataProvider>,
    strategy: StrategyHandle,
    strategy_id: &'static str,
    initial_capital: f64,
    metrics: MetricsConfig,
    interval: Interval,
    training: Option<TrainingReport>,
    run_id: Option<RunId>,
}

impl BacktestEngine {
    /// Engine with 10,000 capital, daily bars and default metric settings.
    pub fn new(
        provider: Arc<dyn DataProvider>,
        strategy: &StrategyConfig,
        features: &FeatureConfig,
    ) -> Result<Self, RunError> {
        Ok(Self {
            provider,
            strategy: create_strategy(strategy, features)?,
            strategy_id: strategy.id(),
            initial_capital: 10_000.0,
            metrics: MetricsConfig::default(),
            interval: Interval::Daily,
            training: None,
            run_id: None,
        })
    }

    /// Engine for a validated config; does not train.
    pub fn from_config(
        provider: Arc<dyn DataProvider>,
        config: &BacktestConfig,
    ) -> Result<Self, RunError> {
        config.validate()?;
        let mut engine = Self::new(provider, &config.strategy, &config.features)?
            .with_initial_capital(config.backtest.initial_capital)
            .with_interval(config.backtest.interval)
            .with_metrics(config.metrics_config());
        engine.run_id = Some(config.run_id()?);
        Ok(engine)
    }

    pub fn with_initial_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn strategy(&self) -> &StrategyHandle {
        &self.strategy
    }

    /// Report from the last successful training, if any.
    pub fn training_report(&self) -> Option<&TrainingReport> {
        self.training.as_ref()
    }

    /// Fit a learned strategy on `[start, end]`. Rule strategies return `Ok(None)`.
    pub fn train(
        &mut self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<TrainingReport>, RunError> {
        if !self.strategy.is_trainable() {
            tracing::debug!(strategy = self.strategy.name(), "rule strategy, nothing to train");
            return Ok(None);
        }
        tracing::info!(strategy = self.strategy.name(), symbol, %start, %end, "training");
        let prices = load_prices(self.provider.as_ref(), symbol, start, end, self.interval)?;
        let report = self.strategy.train(&prices)?;
        self.training = report.clone();
        Ok(report)
    }

    /// Backtest `[start, end]`: load, signal, simulate, measure.
    pub fn run(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestResult, RunError> {
        tracing::info!(strategy = self.strategy.name(), symbol, %start, %end, "backtest started");

        let prices = load_prices(self.provider.as_ref(), symbol, start, end, self.interval)?;
        let signals = self.strategy.generate_signals(&prices)?;
        tracing::debug!(bars = prices.len(), active = signals.active_bars(), "signals generated");

        let frame = simulate(&prices, &signals, self.initial_capital)?;
        let metrics = PerformanceMetrics::compute(
            &frame.strategy_returns(),
            &frame.cumulative_strategy(),
            &self.metrics,
        );
        tracing::info!(
            symbol,
            final_equity = frame.final_equity(),
            total_return_pct = metrics.total_return_pct,
            sharpe = metrics.sharpe,
            "backtest finished"
        );

        Ok(BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id.clone(),
            symbol: symbol.to_string(),
            strategy_id: self.strategy_id.to_string(),
            strategy: self.strategy.name().to_string(),
            interval: self.interval,
            start_date: start,
            end_date: end,
            initial_capital: self.initial_capital,
            final_equity: frame.final_equity(),
            metrics,
            training: self.training.clone(),
            dataset_hash: prices.content_hash(),
            bar_count: prices.len(),
            warmup_bars: self.strategy.warmup_bars(),
            active_bars: signals.active_bars(),
            frame,
        })
    }
}

/// Train if needed, then backtest, all as described by `config`.
pub fn run_from_config(
    provider: Arc<dyn DataProvider>,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    let mut engine = BacktestEngine::from_config(provider, config)?;
    let bt = &config.backtest;
    engine.train(&bt.symbol, config.training.start_date, config.training.end_date)?;
    engine.run(&bt.symbol, bt.start_date, bt.end_date)
}

/// Run `config` once per symbol in parallel; each run builds its own strategy.
///
/// Results come back in `symbols` order. One failing symbol does not stop the others.
pub fn run_many(
    provider: Arc<dyn DataProvider>,
    config: &BacktestConfig,
    symbols: &[String],
) -> Vec<(String, Result<BacktestResult, RunError>)> {
    tracing::info!(symbols = symbols.len(), strategy = config.strategy.name(), "batch started");
    symbols
        .par_iter()
        .map(|symbol| {
            let mut job = config.clone();
            job.backtest.symbol = symbol.clone();
            let result = run_from_config(Arc::clone(&provider), &job);
            if let Err(e) = &result {
                tracing::warn!(symbol = %symbol, error = %e, "batch job failed");
            }
            (symbol.clone(), result)
        })
        .collect()
}
