//! SignalBench Runner — backtest orchestration, configuration, metrics, artifacts.
//!
//! This crate builds on `signalbench-core` to provide:
//! - TOML run configuration
//! - A backtest engine that trains, runs and measures one strategy
//! - Parallel batch runs over several symbols
//! - Performance metrics over return series
//! - Equity CSV and JSON summary export

pub mod config;
pub mod export;
pub mod metrics;
pub mod result;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, ConfigError, MetricsSection, RunId, TrainingSection};
pub use export::{export_equity_csv, export_json, load_summary, save_artifacts};
pub use metrics::{MetricsConfig, PerformanceMetrics};
pub use result::{format_money, BacktestResult, ResultSummary, SCHEMA_VERSION};
pub use runner::{run_from_config, run_many, BacktestEngine, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<MetricsConfig>();
        assert_sync::<MetricsConfig>();
    }

    #[test]
    fn backtest_engine_is_send_sync() {
        assert_send::<BacktestEngine>();
        assert_sync::<BacktestEngine>();
    }
}
