//! Moving average crossover — long while the short SMA is above the long SMA.
//!
//! Long-only: the signal is flat whenever the short SMA is at or below the
//! long SMA. Both SMAs average partial windows from the first bar, so the
//! strategy has no warm-up.

use super::{Strategy, StrategyError};
use crate::domain::{PriceSeries, SignalSeries, FLAT, LONG};
use crate::indicators::{Indicator, Sma};

#[derive(Debug, Clone)]
pub struct MaCrossover {
    short: Sma,
    long: Sma,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        assert!(short_window >= 1, "short_window must be >= 1");
        assert!(
            long_window > short_window,
            "long_window must be > short_window"
        );
        Self {
            short: Sma::partial(short_window),
            long: Sma::partial(long_window),
        }
    }

    pub fn default_params() -> Self {
        Self::new(50, 200)
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn generate_signals(&self, prices: &PriceSeries) -> Result<SignalSeries, StrategyError> {
        let short = self.short.compute(prices.bars());
        let long = self.long.compute(prices.bars());
        let values = short
            .iter()
            .zip(&long)
            .map(|(s, l)| if s > l { LONG } else { FLAT })
            .collect();
        Ok(SignalSeries::new(prices.dates(), values))
    }
}
