//! Momentum — long while the close is above the close `period` bars earlier.

use super::{Strategy, StrategyError};
use crate::domain::{PriceSeries, SignalSeries, FLAT, LONG};
use crate::indicators::{Indicator, Momentum};

#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    momentum: Momentum,
    period: usize,
}

impl MomentumStrategy {
    pub fn new(period: usize) -> Self {
        Self {
            momentum: Momentum::new(period),
            period,
        }
    }

    pub fn default_params() -> Self {
        Self::new(10)
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        "momentum"
    }

    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn generate_signals(&self, prices: &PriceSeries) -> Result<SignalSeries, StrategyError> {
        let values = self
            .momentum
            .compute(prices.bars())
            .into_iter()
            .map(|m| if m > 0.0 { LONG } else { FLAT })
            .collect();
        Ok(SignalSeries::new(prices.dates(), values))
    }
}
