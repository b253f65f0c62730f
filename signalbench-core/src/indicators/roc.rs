//! Rate of Change (ROC).
//!
//! ROC[t] = (close[t] / close[t - period] - 1) * 100
//! Lookback: period.

use super::rolling::pct_change;
use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: "roc".to_string(),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        pct_change(&closes(bars), self.period)
            .into_iter()
            .map(|v| v * 100.0)
            .collect()
    }
}
