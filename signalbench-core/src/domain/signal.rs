//! Signal series — one position target per bar, aligned to a price index.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const LONG: f64 = 1.0;
pub const FLAT: f64 = 0.0;
pub const SHORT: f64 = -1.0;

/// Position targets in {-1, 0, +1}, one per bar of the source price series.
///
/// Bars before a strategy's warm-up are flat (0), never undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl SignalSeries {
    /// Build a series from parallel date/value vectors.
    ///
    /// # Panics
    /// Panics if the two vectors differ in length.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        assert_eq!(dates.len(), values.len(), "signal dates/values length mismatch");
        Self { dates, values }
    }

    /// All-flat series over the given dates.
    pub fn flat(dates: Vec<NaiveDate>) -> Self {
        let values = vec![FLAT; dates.len()];
        Self { dates, values }
    }

    /// Re-index sparse values onto the full price index.
    ///
    /// `sparse_dates` must be sorted ascending. Dates of `index` with no
    /// matching sparse entry are filled with flat.
    pub fn align(index: &[NaiveDate], sparse_dates: &[NaiveDate], sparse_values: &[f64]) -> Self {
        let mut values = vec![FLAT; index.len()];
        let mut j = 0;
        for (i, date) in index.iter().enumerate() {
            while j < sparse_dates.len() && sparse_dates[j] < *date {
                j += 1;
            }
            if j < sparse_dates.len() && sparse_dates[j] == *date {
                values[i] = sparse_values[j];
            }
        }
        Self {
            dates: index.to_vec(),
            values,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Number of bars with a non-flat target.
    pub fn active_bars(&self) -> usize {
        self.values.iter().filter(|v| **v != FLAT).count()
    }
}
