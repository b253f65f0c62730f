//! Criterion benchmarks for SignalBench hot paths.
//!
//! Benchmarks:
//! 1. Indicator batch (the feature indicator set over one series)
//! 2. Feature table build (indicators + lags)
//! 3. Rule strategy signal generation
//! 4. Return simulation
//! 5. Random forest fit on a feature matrix

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signalbench_core::domain::{Bar, PriceSeries};
use signalbench_core::engine::simulate;
use signalbench_core::features::{build_features, FeatureConfig};
use signalbench_core::predictor::{ForestConfig, Predictor, RandomForest};
use signalbench_core::strategy::{MaCrossover, RsiReversion, Strategy};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.01;
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000.0 + (i % 500) as f64,
            )
        })
        .collect();
    PriceSeries::from_bars("BENCH", bars).unwrap()
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let config = FeatureConfig::default();
    for n in [1_000, 5_000] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, series| {
            b.iter(|| {
                for indicator in config.indicators() {
                    black_box(indicator.compute(series.bars()));
                }
            })
        });
    }
    group.finish();
}

// ── 2. Features ──────────────────────────────────────────────────────

fn bench_features(c: &mut Criterion) {
    let series = make_series(5_000);
    let config = FeatureConfig::default();
    c.bench_function("build_features_5000", |b| {
        b.iter(|| build_features(black_box(&series), &config).unwrap())
    });
}

// ── 3. Rule strategies ───────────────────────────────────────────────

fn bench_rule_strategies(c: &mut Criterion) {
    let series = make_series(5_000);
    let crossover = MaCrossover::default_params();
    let rsi = RsiReversion::default_params();
    c.bench_function("sma_crossover_5000", |b| {
        b.iter(|| crossover.generate_signals(black_box(&series)).unwrap())
    });
    c.bench_function("rsi_reversion_5000", |b| {
        b.iter(|| rsi.generate_signals(black_box(&series)).unwrap())
    });
}

// ── 4. Simulation ────────────────────────────────────────────────────

fn bench_simulate(c: &mut Criterion) {
    let series = make_series(5_000);
    let signals = MaCrossover::default_params()
        .generate_signals(&series)
        .unwrap();
    c.bench_function("simulate_5000", |b| {
        b.iter(|| simulate(black_box(&series), black_box(&signals), 10_000.0).unwrap())
    });
}

// ── 5. Forest fit ────────────────────────────────────────────────────

fn bench_forest_fit(c: &mut Criterion) {
    let table = build_features(&make_series(1_500), &FeatureConfig::default()).unwrap();
    let close = table.column("close").unwrap();
    let y: Vec<u8> = close.windows(2).map(|w| u8::from(w[1] > w[0])).collect();
    let mut x = table.feature_matrix();
    x.truncate(y.len());

    let mut group = c.benchmark_group("forest_fit");
    group.sample_size(10);
    for n_trees in [10, 50] {
        let config = ForestConfig {
            n_trees,
            ..ForestConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(n_trees), &config, |b, config| {
            b.iter(|| {
                let mut forest = RandomForest::new(config.clone());
                forest.fit(&x, &y).unwrap();
                forest
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_indicators,
    bench_features,
    bench_rule_strategies,
    bench_simulate,
    bench_forest_fit
);
criterion_main!(benches);
