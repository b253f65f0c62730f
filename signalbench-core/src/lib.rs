//! SignalBench Core — price data, indicators, features, strategies and return simulation.
//!
//! This crate holds the pure part of a single-asset signal backtest:
//! - Domain types (bars, price series, signal series)
//! - Data providers (Yahoo Finance chart API, CSV files, in-memory)
//! - Causal technical indicators with NaN warm-up
//! - Feature tables, scaling and sequence windows for learned strategies
//! - Predictors (logistic regression, random forest)
//! - Rule-based and learned strategies behind one trait pair
//! - Vectorised return simulation (signal at t earns the return t → t+1)

pub mod data;
pub mod domain;
pub mod engine;
pub mod features;
pub mod indicators;
pub mod predictor;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across `run_many` workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::SignalSeries>();
        require_sync::<domain::SignalSeries>();

        // Data
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::MemoryProvider>();
        require_sync::<data::MemoryProvider>();

        // Features and predictors
        require_send::<features::FeatureTable>();
        require_sync::<features::FeatureTable>();
        require_send::<features::StandardScaler>();
        require_sync::<features::StandardScaler>();
        require_send::<predictor::RandomForest>();
        require_sync::<predictor::RandomForest>();

        // Strategies and results
        require_send::<strategy::StrategyHandle>();
        require_sync::<strategy::StrategyHandle>();
        require_send::<engine::ReturnsFrame>();
        require_sync::<engine::ReturnsFrame>();
    }
}
