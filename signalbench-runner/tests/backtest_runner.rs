//! Integration tests for the runner: every strategy end to end on synthetic data.
//!
//! Each strategy id is run from a TOML config against an in-memory provider
//! (and once through the CSV provider) to verify training, simulation,
//! metrics and artifacts together.

use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use signalbench_core::data::{CsvProvider, DataProvider, MemoryProvider};
use signalbench_core::domain::Bar;
use signalbench_core::features::FeatureError;
use signalbench_runner::{
    load_summary, run_from_config, run_many, save_artifacts, BacktestConfig, BacktestEngine,
    BacktestResult, ConfigError, RunError,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 2018-01-01 .. 2020-12-31, one bar per calendar day.
fn synthetic_bars(phase: f64) -> Vec<Bar> {
    let start = d(2018, 1, 1);
    (0..1096)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + t * 0.03 + (t / 11.0 + phase).sin() * 5.0 + (t / 3.0).cos();
            Bar::new(
                start + chrono::Duration::days(i),
                close - 0.2,
                close + 1.0,
                close - 1.0,
                close,
                10_000.0 + (i % 13) as f64 * 500.0,
            )
        })
        .collect()
}

fn provider() -> Arc<dyn DataProvider> {
    Arc::new(
        MemoryProvider::new()
            .with_bars("SYN", synthetic_bars(0.0))
            .with_bars("ALT", synthetic_bars(1.3)),
    )
}

fn config(strategy_toml: &str) -> BacktestConfig {
    let toml_str = format!(
        r#"[backtest]
symbol = "SYN"
start_date = "2020-01-01"
end_date = "2020-12-31"
initial_capital = 10000.0

[training]
start_date = "2018-01-01"
end_date = "2019-12-31"

[strategy]
{strategy_toml}
"#
    );
    BacktestConfig::from_toml(&toml_str).unwrap()
}

fn verify(result: &BacktestResult, name: &str) {
    // 2020 is a leap year
    assert_eq!(result.bar_count, 366, "{name}: bar count");
    assert_eq!(result.frame.len(), 365, "{name}: frame drops the first bar");

    let m = &result.metrics;
    for (label, value) in [
        ("total_return_pct", m.total_return_pct),
        ("cagr", m.cagr),
        ("sharpe", m.sharpe),
        ("max_drawdown", m.max_drawdown),
        ("volatility", m.volatility),
        ("win_rate", m.win_rate),
    ] {
        assert!(value.is_finite(), "{name}: {label} not finite");
    }
    assert!(
        m.max_drawdown <= 0.0 && m.max_drawdown > -1.0,
        "{name}: max_drawdown out of range: {}",
        m.max_drawdown
    );
    assert!(
        (0.0..=1.0).contains(&m.win_rate),
        "{name}: win_rate out of range: {}",
        m.win_rate
    );

    // final equity agrees with total return
    let implied = result.initial_capital * (1.0 + m.total_return_pct / 100.0);
    assert!(
        (result.final_equity - implied).abs() < 1e-6,
        "{name}: final equity {} vs implied {implied}",
        result.final_equity
    );
    assert!(result.run_id.is_some(), "{name}: run id missing");
}

// ── Per-strategy tests ───────────────────────────────────────────

#[test]
fn sma_crossover_on_synthetic() {
    let result = run_from_config(
        provider(),
        &config("type = \"sma_crossover\"\nshort_window = 10\nlong_window = 40"),
    )
    .unwrap();
    verify(&result, "sma");
    assert!(result.training.is_none());
    assert!(result.active_bars > 0);
}

#[test]
fn rsi_reversion_on_synthetic() {
    let result = run_from_config(provider(), &config("type = \"rsi_reversion\"")).unwrap();
    verify(&result, "rsi");
    assert_eq!(result.warmup_bars, 14);
}

#[test]
fn momentum_on_synthetic() {
    let result = run_from_config(provider(), &config("type = \"momentum\"")).unwrap();
    verify(&result, "momentum");
}

#[test]
fn logistic_trains_then_runs() {
    let result = run_from_config(provider(), &config("type = \"logistic\"")).unwrap();
    verify(&result, "logistic");
    let training = result.training.as_ref().expect("training report");
    // 730 training bars - 25 warm-up rows - 1 unlabelled
    assert_eq!(training.train_samples + training.test_samples, 704);
    assert_eq!(training.train_samples, 492);
}

#[test]
fn random_forest_trains_then_runs() {
    let result = run_from_config(
        provider(),
        &config("type = \"random_forest\"\nn_trees = 20\nmax_depth = 4"),
    )
    .unwrap();
    verify(&result, "random_forest");
    assert!(result.training.is_some());
    assert_eq!(result.strategy, "random_forest");
    assert_eq!(result.strategy_id, "rf");
}

#[test]
fn sequence_trains_then_runs() {
    let result = run_from_config(
        provider(),
        &config("type = \"sequence\"\nwindow = 20\nmodel = \"logistic\""),
    )
    .unwrap();
    verify(&result, "sequence");
    assert_eq!(result.warmup_bars, 39);
}

// ── Failure modes ────────────────────────────────────────────────

#[test]
fn unknown_symbol_aborts_without_result() {
    let mut cfg = config("type = \"momentum\"");
    cfg.backtest.symbol = "NOPE".into();
    let err = run_from_config(provider(), &cfg).unwrap_err();
    assert!(matches!(err, RunError::Data(_)), "unexpected error: {err}");
}

#[test]
fn training_range_without_data_aborts() {
    let mut cfg = config("type = \"logistic\"");
    cfg.training.start_date = d(2000, 1, 1);
    cfg.training.end_date = d(2000, 12, 31);
    let err = run_from_config(provider(), &cfg).unwrap_err();
    assert!(matches!(err, RunError::Data(_)), "unexpected error: {err}");
}

#[test]
fn invalid_feature_windows_fail_the_run_without_panicking() {
    let mut cfg = config("type = \"logistic\"");
    cfg.features.bollinger_period = 1;
    let err = run_from_config(provider(), &cfg).unwrap_err();
    assert!(
        matches!(err, RunError::Config(ConfigError::Feature(FeatureError::InvalidConfig(_)))),
        "unexpected error: {err}"
    );

    // the engine constructor rejects it too, without going through config validation
    let Err(err) = BacktestEngine::new(provider(), &cfg.strategy, &cfg.features) else {
        panic!("engine accepted an invalid feature config");
    };
    assert!(matches!(err, RunError::Strategy(_)), "unexpected error: {err}");
}

// ── Batch ────────────────────────────────────────────────────────

#[test]
fn run_many_keeps_symbol_order_and_isolates_failures() {
    let cfg = config("type = \"rsi_reversion\"");
    let symbols = vec!["ALT".to_string(), "NOPE".to_string(), "SYN".to_string()];
    let results = run_many(provider(), &cfg, &symbols);

    let order: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(order, vec!["ALT", "NOPE", "SYN"]);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_err());

    let single = run_from_config(provider(), &cfg).unwrap();
    let batched = results[2].1.as_ref().unwrap();
    assert_eq!(batched.final_equity, single.final_equity);
}

// ── CSV provider + artifacts ─────────────────────────────────────

#[test]
fn csv_run_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join("SYN.csv")).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
    for bar in synthetic_bars(0.0) {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        )
        .unwrap();
    }
    drop(file);

    let provider: Arc<dyn DataProvider> = Arc::new(CsvProvider::from_dir(dir.path()));
    let cfg = config("type = \"momentum\"");
    let from_csv = run_from_config(provider, &cfg).unwrap();
    let from_memory = run_from_config(self::provider(), &cfg).unwrap();
    assert!((from_csv.final_equity - from_memory.final_equity).abs() < 1e-6);

    let out = dir.path().join("out");
    save_artifacts(&from_csv, &out).unwrap();
    let equity = std::fs::read_to_string(out.join("equity.csv")).unwrap();
    assert_eq!(equity.lines().count(), 366);
    assert_eq!(load_summary(&out).unwrap(), from_csv.summary());
}
