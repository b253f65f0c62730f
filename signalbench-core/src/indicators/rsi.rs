//! Relative Strength Index (RSI).
//!
//! Simple rolling means of gains and of loss magnitudes over the close-to-close
//! deltas: RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! The first delta is undefined, so the first value lands at index `period`.
//! Lookback: period.
//! Edge case: avg_loss == 0 → RSI = 100 (never NaN).

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: "rsi".to_string(),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rsi_of_series(&closes(bars), self.period)
    }
}

/// RSI over an arbitrary price series.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    for i in period..n {
        let mut gain = 0.0;
        let mut loss = 0.0;
        let mut defined = true;
        for k in (i + 1 - period)..=i {
            let delta = values[k] - values[k - 1];
            if delta.is_nan() {
                defined = false;
                break;
            }
            if delta > 0.0 {
                gain += delta;
            } else {
                loss -= delta;
            }
        }
        if defined {
            result[i] = compute_rsi(gain / period as f64, loss / period as f64);
        }
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
