//! Price series — an immutable, validated, time-ordered run of bars.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::DataError;
use crate::domain::Bar;

/// Time-indexed OHLCV table for one symbol.
///
/// Invariants established by [`PriceSeries::from_bars`]:
/// - every bar is numeric (rows with NaN/inf fields are dropped),
/// - dates are strictly increasing and unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from raw bars.
    ///
    /// Non-numeric rows are dropped, the remainder is sorted by date, and a
    /// duplicated date is rejected as a validation error.
    pub fn from_bars(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        let symbol = symbol.into();
        let total = bars.len();
        let mut bars: Vec<Bar> = bars.into_iter().filter(|b| !b.is_void()).collect();
        let dropped = total - bars.len();
        if dropped > 0 {
            tracing::warn!(symbol = %symbol, dropped, "dropped non-numeric bars");
        }

        bars.sort_by_key(|b| b.date);

        let mut seen = HashSet::with_capacity(bars.len());
        for bar in &bars {
            if !seen.insert(bar.date) {
                return Err(DataError::Validation(format!(
                    "duplicate bar for {symbol} on {}",
                    bar.date
                )));
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Deterministic BLAKE3 hash over the symbol and every bar's values.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for bar in &self.bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            close + 1.0,
            close - 1.0,
            close,
            1000.0,
        )
    }

    #[test]
    fn drops_void_rows_and_sorts() {
        let mut void = bar(3, 101.0);
        void.close = f64::NAN;
        let series =
            PriceSeries::from_bars("TEST", vec![bar(4, 102.0), void, bar(2, 100.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![100.0, 102.0]);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::from_bars("TEST", vec![bar(2, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[test]
    fn content_hash_changes_with_data() {
        let a = PriceSeries::from_bars("TEST", vec![bar(2, 100.0), bar(3, 101.0)]).unwrap();
        let b = PriceSeries::from_bars("TEST", vec![bar(2, 100.0), bar(3, 101.5)]).unwrap();
        assert_eq!(a.content_hash(), a.clone().content_hash());
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
