//! RSI mean reversion — buy oversold, sell overbought, hold in between.
//!
//! Triggers: +1 where RSI < buy threshold, -1 where RSI > sell threshold.
//! Between triggers the most recent trigger is carried forward; the signal is
//! flat only before the first trigger. Undefined RSI never triggers.

use super::{Strategy, StrategyError};
use crate::domain::{PriceSeries, SignalSeries, FLAT, LONG, SHORT};
use crate::indicators::{Indicator, Rsi};

#[derive(Debug, Clone)]
pub struct RsiReversion {
    rsi: Rsi,
    period: usize,
    buy_threshold: f64,
    sell_threshold: f64,
}

impl RsiReversion {
    pub fn new(period: usize, buy_threshold: f64, sell_threshold: f64) -> Self {
        assert!(
            buy_threshold < sell_threshold,
            "buy_threshold must be below sell_threshold"
        );
        Self {
            rsi: Rsi::new(period),
            period,
            buy_threshold,
            sell_threshold,
        }
    }

    pub fn default_params() -> Self {
        Self::new(14, 30.0, 70.0)
    }

    /// Map RSI values to held positions.
    pub fn positions_from_rsi(&self, rsi: &[f64]) -> Vec<f64> {
        let mut held = FLAT;
        rsi.iter()
            .map(|&value| {
                if value < self.buy_threshold {
                    held = LONG;
                } else if value > self.sell_threshold {
                    held = SHORT;
                }
                held
            })
            .collect()
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        "rsi_reversion"
    }

    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn generate_signals(&self, prices: &PriceSeries) -> Result<SignalSeries, StrategyError> {
        let rsi = self.rsi.compute(prices.bars());
        Ok(SignalSeries::new(
            prices.dates(),
            self.positions_from_rsi(&rsi),
        ))
    }
}
