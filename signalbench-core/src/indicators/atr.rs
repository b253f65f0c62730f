//! True Range and Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|); undefined
//! on the first bar, which has no previous close.
//! ATR: simple rolling mean of true range over `period` bars.
//! Lookback: 1 for true range, period for ATR.

use super::rolling::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

/// Compute the True Range series from bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];
    for i in 1..bars.len() {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            tr[i] = f64::NAN;
        }
    }
    tr
}

#[derive(Debug, Clone, Default)]
pub struct TrueRange;

impl Indicator for TrueRange {
    fn name(&self) -> &str {
        "true_range"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        true_range(bars)
    }
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: "atr".to_string(),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            high,
            low,
            close,
            1000.0,
        )
    }

    #[test]
    fn true_range_uses_previous_close() {
        let bars = vec![
            bar(1, 11.0, 9.0, 10.0),
            // gap up: |high - prev_close| = 5 dominates high - low = 1
            bar(2, 15.0, 14.0, 14.5),
            // inside bar: high - low = 2
            bar(3, 15.5, 13.5, 14.0),
        ];
        let tr = true_range(&bars);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 5.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_is_rolling_mean_of_tr() {
        let bars = vec![
            bar(1, 11.0, 9.0, 10.0),
            bar(2, 15.0, 14.0, 14.5),
            bar(3, 15.5, 13.5, 14.0),
            bar(4, 14.5, 13.5, 14.0),
        ];
        let atr = Atr::new(2).compute(&bars);
        assert!(atr[0].is_nan() && atr[1].is_nan());
        assert_approx(atr[2], 3.5, DEFAULT_EPSILON);
        assert_approx(atr[3], 1.5, DEFAULT_EPSILON);
        assert_eq!(Atr::new(14).lookback(), 14);
    }
}
