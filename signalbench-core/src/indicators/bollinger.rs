//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! Four lines (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Std: sample stddev(close, period), divide by N-1
//! - Upper: middle + mult * std
//! - Lower: middle - mult * std
//!
//! Lookback: period - 1.

use super::rolling::{rolling_mean, rolling_sample_std};
use super::{closes, Indicator};
use crate::domain::Bar;

/// Which line of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    Std,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    fn build(period: usize, multiplier: f64, band: BollingerBand, name: &str) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        Self {
            period,
            multiplier,
            band,
            name: name.to_string(),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Upper, "bb_upper")
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Middle, "bb_middle")
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::build(period, multiplier, BollingerBand::Lower, "bb_lower")
    }

    pub fn std(period: usize) -> Self {
        Self::build(period, 1.0, BollingerBand::Std, "bb_std")
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let close = closes(bars);
        match self.band {
            BollingerBand::Middle => rolling_mean(&close, self.period),
            BollingerBand::Std => rolling_sample_std(&close, self.period),
            BollingerBand::Upper | BollingerBand::Lower => {
                let sign = if self.band == BollingerBand::Upper {
                    1.0
                } else {
                    -1.0
                };
                rolling_mean(&close, self.period)
                    .iter()
                    .zip(rolling_sample_std(&close, self.period))
                    .map(|(mid, sd)| mid + sign * self.multiplier * sd)
                    .collect()
            }
        }
    }
}
