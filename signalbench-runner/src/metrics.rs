//! Performance metrics — pure functions over return and cumulative-growth series.
//!
//! Returns are per-bar simple returns; cumulative series are growth factors
//! starting from 1.0 (not equity). Degenerate inputs (empty series, zero
//! variance) yield 0 rather than an error or NaN.

use serde::{Deserialize, Serialize};

pub use signalbench_core::predictor::{accuracy, confusion_matrix, ConfusionMatrix};

/// Annualisation and risk-free settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub periods_per_year: f64,
    /// Annual risk-free rate as a fraction (0.02 = 2%).
    pub risk_free_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 252.0,
            risk_free_rate: 0.0,
        }
    }
}

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Percent, e.g. 12.5 for +12.5%.
    pub total_return_pct: f64,
    /// Fraction per year.
    pub cagr: f64,
    pub sharpe: f64,
    /// Negative fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    /// Annualised fraction.
    pub volatility: f64,
    /// Fraction of bars with a strictly positive return.
    pub win_rate: f64,
    pub bar_count: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from strategy returns and their cumulative growth.
    pub fn compute(returns: &[f64], cumulative: &[f64], config: &MetricsConfig) -> Self {
        Self {
            total_return_pct: total_return(cumulative),
            cagr: cagr(cumulative, config.periods_per_year),
            sharpe: sharpe_ratio(returns, config.risk_free_rate, config.periods_per_year),
            max_drawdown: max_drawdown(cumulative),
            volatility: volatility(returns, config.periods_per_year),
            win_rate: win_rate(returns),
            bar_count: returns.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Annualised Sharpe ratio: sqrt(ppy) × mean(excess) / std(excess).
///
/// Returns 0.0 when the returns have zero variance or fewer than 2 bars.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let std = sample_std(returns);
    if std == 0.0 {
        return 0.0;
    }
    let per_period_rf = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();
    periods_per_year.sqrt() * mean(&excess) / sample_std(&excess)
}

/// Maximum drawdown of a cumulative series, as a negative fraction.
///
/// Returns 0.0 for an empty or non-decreasing series.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &value in cumulative {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.min((value - peak) / peak);
        }
    }
    max_dd
}

/// Total return in percent: (last - 1) × 100.
pub fn total_return(cumulative: &[f64]) -> f64 {
    cumulative.last().map_or(0.0, |last| (last - 1.0) * 100.0)
}

/// Annualised volatility: sample std × sqrt(ppy).
pub fn volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    sample_std(returns) * periods_per_year.sqrt()
}

/// Compound annual growth: last^(1 / years) - 1, years = bars / ppy.
///
/// Returns 0.0 for an empty series and -1.0 once the cumulative value hits zero.
pub fn cagr(cumulative: &[f64], periods_per_year: f64) -> f64 {
    let Some(&last) = cumulative.last() else {
        return 0.0;
    };
    let years = cumulative.len() as f64 / periods_per_year;
    if years <= 0.0 {
        return 0.0;
    }
    if last <= 0.0 {
        return -1.0;
    }
    last.powf(1.0 / years) - 1.0
}

/// Fraction of bars with a strictly positive return.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); 0 for fewer than 2 values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    // exactly zero for constant input, where the mean itself may carry rounding noise
    if values.iter().all(|v| *v == values[0]) {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
