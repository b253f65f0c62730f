//! Look-ahead contamination tests for indicators, strategies and the simulator.
//!
//! Invariant: no value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..150) and the full series
//! (bars 0..300). Assert bars 0..150 are identical between both runs. Any
//! difference means future data is leaking into past values.

use chrono::NaiveDate;
use signalbench_core::domain::{Bar, PriceSeries};
use signalbench_core::engine::simulate;
use signalbench_core::features::FeatureConfig;
use signalbench_core::indicators::*;
use signalbench_core::predictor::LogisticRegression;
use signalbench_core::strategy::{
    LearnedClassifier, MaCrossover, MomentumStrategy, RsiReversion, Strategy, Trainable,
};

const FULL: usize = 300;
const TRUNCATED: usize = 150;

/// Generate N bars of synthetic OHLCV data with realistic variation.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed >> 33) % 200) as f64 * 0.02 - 2.0; // -2.0 to +2.0
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0;
        let low = open.min(close) - 2.0;
        bars.push(Bar::new(
            base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            1000.0 + i as f64 * 100.0,
        ));
    }

    bars
}

fn series(bars: &[Bar]) -> PriceSeries {
    PriceSeries::from_bars("TEST", bars.to_vec()).unwrap()
}

fn assert_prefix_identical(name: &str, truncated: &[f64], full: &[f64]) {
    assert_eq!(truncated.len(), TRUNCATED, "{name}: truncated result length mismatch");
    assert_eq!(full.len(), FULL, "{name}: full result length mismatch");

    for i in 0..TRUNCATED {
        let (t, f) = (truncated[i], full[i]);
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{name}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{name}: look-ahead contamination at bar {i}: truncated={t}, full={f}, diff={}",
            (t - f).abs()
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, bars: &[Bar]) {
    assert_prefix_identical(
        indicator.name(),
        &indicator.compute(&bars[..TRUNCATED]),
        &indicator.compute(bars),
    );
}

fn assert_strategy_no_lookahead(strategy: &dyn Strategy, bars: &[Bar]) {
    let truncated = strategy.generate_signals(&series(&bars[..TRUNCATED])).unwrap();
    let full = strategy.generate_signals(&series(bars)).unwrap();
    assert_prefix_identical(strategy.name(), truncated.values(), full.values());
}

// ── Indicators ───────────────────────────────────────────────────────

#[test]
fn no_lookahead_sma() {
    let bars = make_test_bars(FULL);
    assert_no_lookahead(&Sma::new(20), &bars);
    assert_no_lookahead(&Sma::partial(50), &bars);
}

#[test]
fn no_lookahead_ema() {
    assert_no_lookahead(&Ema::new(12), &make_test_bars(FULL));
}

#[test]
fn no_lookahead_rsi() {
    assert_no_lookahead(&Rsi::new(14), &make_test_bars(FULL));
}

#[test]
fn no_lookahead_macd() {
    let bars = make_test_bars(FULL);
    assert_no_lookahead(&Macd::line(12, 26, 9), &bars);
    assert_no_lookahead(&Macd::signal_line(12, 26, 9), &bars);
}

#[test]
fn no_lookahead_bollinger() {
    let bars = make_test_bars(FULL);
    assert_no_lookahead(&Bollinger::upper(20, 2.0), &bars);
    assert_no_lookahead(&Bollinger::middle(20, 2.0), &bars);
    assert_no_lookahead(&Bollinger::lower(20, 2.0), &bars);
    assert_no_lookahead(&Bollinger::std(20), &bars);
}

#[test]
fn no_lookahead_roc_and_momentum() {
    let bars = make_test_bars(FULL);
    assert_no_lookahead(&Roc::new(10), &bars);
    assert_no_lookahead(&Momentum::new(10), &bars);
}

#[test]
fn no_lookahead_true_range_and_atr() {
    let bars = make_test_bars(FULL);
    assert_no_lookahead(&TrueRange, &bars);
    assert_no_lookahead(&Atr::new(14), &bars);
}

// ── Strategies ───────────────────────────────────────────────────────

#[test]
fn no_lookahead_rule_strategies() {
    let bars = make_test_bars(FULL);
    assert_strategy_no_lookahead(&MaCrossover::new(10, 30), &bars);
    assert_strategy_no_lookahead(&RsiReversion::default_params(), &bars);
    assert_strategy_no_lookahead(&MomentumStrategy::default_params(), &bars);
}

#[test]
fn no_lookahead_trained_classifier() {
    let bars = make_test_bars(FULL);
    let mut strategy = LearnedClassifier::new(
        "logistic",
        LogisticRegression::default(),
        FeatureConfig::default(),
        0.7,
    );
    strategy.train(&series(&bars)).unwrap();
    assert_strategy_no_lookahead(&strategy, &bars);
}

// ── Simulator ────────────────────────────────────────────────────────

#[test]
fn future_close_never_changes_past_strategy_returns() {
    let bars = make_test_bars(FULL);
    let strategy = MomentumStrategy::new(5);

    let base = series(&bars);
    let base_frame = simulate(&base, &strategy.generate_signals(&base).unwrap(), 1.0).unwrap();

    let t = 200;
    let mut shocked_bars = bars.clone();
    shocked_bars[t].close *= 1.5;
    let shocked = series(&shocked_bars);
    let shocked_frame =
        simulate(&shocked, &strategy.generate_signals(&shocked).unwrap(), 1.0).unwrap();

    // frame row k holds bar k + 1
    let before = t - 1;
    assert_eq!(
        &base_frame.strategy_returns()[..before],
        &shocked_frame.strategy_returns()[..before]
    );
    assert_ne!(
        base_frame.market_returns()[before],
        shocked_frame.market_returns()[before]
    );
}
