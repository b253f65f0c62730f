//! Vectorised return simulation.
//!
//! Turns a price series and an aligned signal series into per-bar market and
//! strategy returns, cumulative growth factors and an equity curve:
//!
//! 1. market return at t = close[t] / close[t-1] - 1
//! 2. strategy return at t = signal[t-1] × market return at t
//! 3. bar 0 has no return and is dropped
//! 4. cumulative factors are running products of (1 + return)
//! 5. equity = initial capital × cumulative strategy factor
//!
//! A signal therefore only ever earns the return of the bar after it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceSeries, SignalSeries};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("signal length {signals} does not match price length {prices}")]
    SignalLengthMismatch { prices: usize, signals: usize },

    #[error("non-finite signal {value} at bar {index}")]
    NonFiniteSignal { index: usize, value: f64 },

    #[error("need at least 2 bars to compute returns, got {0}")]
    InsufficientBars(usize),

    #[error("initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),
}

/// One simulated bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRow {
    pub date: NaiveDate,
    pub close: f64,
    /// Target emitted at this bar; earns the next bar's return.
    pub signal: f64,
    /// Position held over this bar (the previous bar's signal).
    pub position: f64,
    pub market_return: f64,
    pub strategy_return: f64,
    pub cumulative_market: f64,
    pub cumulative_strategy: f64,
    pub equity: f64,
}

/// Simulated returns and equity, one row per bar after the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsFrame {
    initial_capital: f64,
    rows: Vec<FrameRow>,
}

impl ReturnsFrame {
    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn rows(&self) -> &[FrameRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn market_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.market_return).collect()
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.strategy_return).collect()
    }

    pub fn cumulative_market(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cumulative_market).collect()
    }

    pub fn cumulative_strategy(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cumulative_strategy).collect()
    }

    pub fn equity(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.equity).collect()
    }

    /// Equity after the last bar; the initial capital for an empty frame.
    pub fn final_equity(&self) -> f64 {
        self.rows
            .last()
            .map_or(self.initial_capital, |r| r.equity)
    }
}

/// Simulate holding `signals[t-1]` over each bar t.
pub fn simulate(
    prices: &PriceSeries,
    signals: &SignalSeries,
    initial_capital: f64,
) -> Result<ReturnsFrame, EngineError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(EngineError::InvalidCapital(initial_capital));
    }
    if signals.len() != prices.len() {
        return Err(EngineError::SignalLengthMismatch {
            prices: prices.len(),
            signals: signals.len(),
        });
    }
    if prices.len() < 2 {
        return Err(EngineError::InsufficientBars(prices.len()));
    }
    if let Some((index, &value)) = signals
        .values()
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite())
    {
        return Err(EngineError::NonFiniteSignal { index, value });
    }

    let bars = prices.bars();
    let values = signals.values();
    let mut cumulative_market = 1.0;
    let mut cumulative_strategy = 1.0;
    let rows: Vec<FrameRow> = (1..bars.len())
        .map(|t| {
            let market_return = bars[t].close / bars[t - 1].close - 1.0;
            let position = values[t - 1];
            let strategy_return = position * market_return;
            cumulative_market *= 1.0 + market_return;
            cumulative_strategy *= 1.0 + strategy_return;
            FrameRow {
                date: bars[t].date,
                close: bars[t].close,
                signal: values[t],
                position,
                market_return,
                strategy_return,
                cumulative_market,
                cumulative_strategy,
                equity: initial_capital * cumulative_strategy,
            }
        })
        .collect();

    tracing::debug!(
        symbol = prices.symbol(),
        bars = rows.len(),
        final_factor = cumulative_strategy,
        "returns simulated"
    );
    Ok(ReturnsFrame {
        initial_capital,
        rows,
    })
}
