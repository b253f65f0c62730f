//! Feature engineering: indicator columns, lag features, scaling and
//! sequence windows for the learned strategies.
//!
//! A [`FeatureTable`] keeps the OHLCV columns of a price series next to the
//! derived columns. Every builder drops the warm-up prefix afterwards, so a
//! returned table has no undefined values.

pub mod scaler;
pub mod sequence;

pub use scaler::StandardScaler;
pub use sequence::{window_for_sequence_model, SequenceBatch};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceSeries;
use crate::indicators::rolling::{pct_change, shift};
use crate::indicators::{Atr, Bollinger, Indicator, Macd, Roc, Rsi, TrueRange};

/// Raw price columns carried by every table.
pub const PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Columns that are never model inputs.
const NON_FEATURE_COLUMNS: [&str; 7] = ["open", "high", "low", "close", "volume", "target", "signal"];

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("shape mismatch: expected {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("insufficient rows: need at least {needed}, got {actual}")]
    InsufficientRows { needed: usize, actual: usize },

    #[error("invalid feature config: {0}")]
    InvalidConfig(String),
}

/// Window lengths for every derived column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub roc_period: usize,
    pub atr_period: usize,
    pub lags: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            roc_period: 10,
            atr_period: 14,
            lags: 5,
        }
    }
}

impl FeatureConfig {
    /// Reject window lengths the indicators cannot be built with.
    pub fn validate(&self) -> Result<(), FeatureError> {
        let invalid = |msg: String| Err(FeatureError::InvalidConfig(msg));
        for (name, value) in [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("roc_period", self.roc_period),
            ("atr_period", self.atr_period),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be >= 1"));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return invalid(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                self.macd_fast, self.macd_slow
            ));
        }
        if self.bollinger_period < 2 {
            return invalid(format!(
                "bollinger_period must be >= 2, got {}",
                self.bollinger_period
            ));
        }
        if !(self.bollinger_multiplier.is_finite() && self.bollinger_multiplier > 0.0) {
            return invalid(format!(
                "bollinger_multiplier must be positive, got {}",
                self.bollinger_multiplier
            ));
        }
        Ok(())
    }

    /// The indicator set, in column order.
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        let (p, m) = (self.bollinger_period, self.bollinger_multiplier);
        vec![
            Box::new(Rsi::new(self.rsi_period)),
            Box::new(Macd::line(self.macd_fast, self.macd_slow, self.macd_signal)),
            Box::new(Macd::signal_line(self.macd_fast, self.macd_slow, self.macd_signal)),
            Box::new(Bollinger::middle(p, m)),
            Box::new(Bollinger::std(p)),
            Box::new(Bollinger::upper(p, m)),
            Box::new(Bollinger::lower(p, m)),
            Box::new(Roc::new(self.roc_period)),
            Box::new(TrueRange),
            Box::new(Atr::new(self.atr_period)),
        ]
    }

    /// Leading rows dropped by [`add_indicators`].
    pub fn indicator_warmup(&self) -> usize {
        self.indicators()
            .iter()
            .map(|i| i.lookback())
            .max()
            .unwrap_or(0)
    }

    /// Leading rows dropped by indicators plus lag features.
    pub fn total_warmup(&self) -> usize {
        let lag_warmup = if self.lags == 0 { 0 } else { self.lags + 1 };
        self.indicator_warmup() + lag_warmup
    }
}

/// Date-indexed table of named `f64` columns, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl FeatureTable {
    /// Table holding the OHLCV columns of a price series.
    pub fn from_prices(prices: &PriceSeries) -> Self {
        let mut table = Self {
            dates: prices.dates(),
            columns: Vec::with_capacity(PRICE_COLUMNS.len()),
        };
        table.insert_column("open", prices.opens());
        table.insert_column("high", prices.highs());
        table.insert_column("low", prices.lows());
        table.insert_column("close", prices.closes());
        table.insert_column("volume", prices.volumes());
        table
    }

    /// Insert or replace a column.
    ///
    /// # Panics
    /// Panics if `values` is not one value per row.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        assert_eq!(values.len(), self.dates.len(), "column length must match row count");
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
    }

    pub fn column(&self, name: &str) -> Result<&[f64], FeatureError> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Model-input columns: everything except OHLCV, target and signal.
    pub fn feature_columns(&self) -> Vec<&str> {
        self.column_names()
            .into_iter()
            .filter(|n| !NON_FEATURE_COLUMNS.contains(n))
            .collect()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Keep only rows where every column is defined.
    pub fn drop_incomplete_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.columns.iter().all(|(_, v)| !v[i].is_nan()))
            .collect();
        self.select_rows(&keep)
    }

    /// Rows `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        Self {
            dates: self.dates[start..end].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(n, v)| (n.clone(), v[start..end].to_vec()))
                .collect(),
        }
    }

    fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            dates: rows.iter().map(|&i| self.dates[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(n, v)| (n.clone(), rows.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }

    /// Model-input matrix, one row per bar, columns in [`Self::feature_columns`] order.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        let features: Vec<&[f64]> = self
            .columns
            .iter()
            .filter(|(n, _)| !NON_FEATURE_COLUMNS.contains(&n.as_str()))
            .map(|(_, v)| v.as_slice())
            .collect();
        (0..self.len())
            .map(|i| features.iter().map(|col| col[i]).collect())
            .collect()
    }
}

/// Add every indicator column and drop the warm-up prefix.
pub fn add_indicators(
    prices: &PriceSeries,
    config: &FeatureConfig,
) -> Result<FeatureTable, FeatureError> {
    config.validate()?;
    let mut table = FeatureTable::from_prices(prices);
    let indicators = config.indicators();
    for indicator in &indicators {
        table.insert_column(indicator.name(), indicator.compute(prices.bars()));
    }

    let table = table.drop_incomplete_rows();
    tracing::debug!(
        rows_in = prices.len(),
        rows_out = table.len(),
        columns = indicators.len(),
        "indicator columns added"
    );
    if table.is_empty() {
        return Err(FeatureError::InsufficientRows {
            needed: config.indicator_warmup() + 1,
            actual: prices.len(),
        });
    }
    Ok(table)
}

/// Append `close_lag_k` and `return_lag_k` for k in 1..=lags, then drop undefined rows.
pub fn add_lag_features(table: &FeatureTable, lags: usize) -> Result<FeatureTable, FeatureError> {
    if lags == 0 {
        return Ok(table.clone());
    }
    let close = table.column("close")?.to_vec();
    let returns = pct_change(&close, 1);

    let mut out = table.clone();
    for k in 1..=lags {
        out.insert_column(format!("close_lag_{k}"), shift(&close, k));
        out.insert_column(format!("return_lag_{k}"), shift(&returns, k));
    }

    let out = out.drop_incomplete_rows();
    if out.is_empty() {
        return Err(FeatureError::InsufficientRows {
            needed: lags + 2,
            actual: table.len(),
        });
    }
    Ok(out)
}

/// Indicators followed by lag features.
pub fn build_features(
    prices: &PriceSeries,
    config: &FeatureConfig,
) -> Result<FeatureTable, FeatureError> {
    let table = add_indicators(prices, config)?;
    add_lag_features(&table, config.lags)
}

#[cfg(test)]
pub(crate) fn trending_prices(n: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + i as f64 * 0.5 + (i as f64 * 0.7).sin() * 3.0)
        .collect();
    PriceSeries::from_bars("TEST", crate::indicators::make_bars(&closes)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicators_drop_bollinger_warmup() {
        let prices = trending_prices(60);
        let config = FeatureConfig::default();
        assert_eq!(config.indicator_warmup(), 19);

        let table = add_indicators(&prices, &config).unwrap();
        assert_eq!(table.len(), 60 - 19);
        assert_eq!(table.dates()[0], prices.dates()[19]);
        assert_eq!(
            table.feature_columns(),
            vec![
                "rsi",
                "macd",
                "macd_signal",
                "bb_middle",
                "bb_std",
                "bb_upper",
                "bb_lower",
                "roc",
                "true_range",
                "atr"
            ]
        );
        for name in table.column_names() {
            assert!(table.column(name).unwrap().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn lag_features_are_shifted_closes_and_returns() {
        let prices = trending_prices(60);
        let base = add_indicators(&prices, &FeatureConfig::default()).unwrap();
        let lagged = add_lag_features(&base, 2).unwrap();

        // return_lag_2 needs three rows of history
        assert_eq!(lagged.len(), base.len() - 3);
        let close = base.column("close").unwrap();
        let lag1 = lagged.column("close_lag_1").unwrap();
        let ret2 = lagged.column("return_lag_2").unwrap();
        assert_eq!(lag1[0], close[2]);
        assert!((ret2[0] - (close[1] / close[0] - 1.0)).abs() < 1e-12);
        assert!(lagged.feature_columns().contains(&"return_lag_2"));
    }

    #[test]
    fn too_short_series_is_insufficient() {
        let prices = trending_prices(10);
        let err = add_indicators(&prices, &FeatureConfig::default()).unwrap_err();
        assert!(matches!(err, FeatureError::InsufficientRows { .. }));
    }

    #[test]
    fn feature_matrix_excludes_price_and_target_columns() {
        let prices = trending_prices(40);
        let mut table = add_indicators(&prices, &FeatureConfig::default()).unwrap();
        table.insert_column("target", vec![1.0; table.len()]);
        let matrix = table.feature_matrix();
        assert_eq!(matrix.len(), table.len());
        assert_eq!(matrix[0].len(), 10);
        assert_eq!(matrix[0][0], table.column("rsi").unwrap()[0]);
    }

    #[test]
    fn missing_column_is_reported() {
        let table = FeatureTable::from_prices(&trending_prices(5));
        assert!(matches!(
            table.column("rsi"),
            Err(FeatureError::MissingColumn(_))
        ));
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: FeatureConfig = serde_json::from_str(r#"{"lags": 3}"#).unwrap();
        assert_eq!(config.lags, 3);
        assert_eq!(config.rsi_period, 14);
        assert_eq!(config.total_warmup(), 19 + 4);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(FeatureConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_windows_are_rejected_not_panicked() {
        let cases: [(&str, fn(&mut FeatureConfig)); 8] = [
            ("rsi_period", |c| c.rsi_period = 0),
            ("macd_fast", |c| c.macd_fast = 0),
            ("macd_signal", |c| c.macd_signal = 0),
            ("macd_slow", |c| c.macd_slow = c.macd_fast),
            ("bollinger_period", |c| c.bollinger_period = 1),
            ("bollinger_multiplier", |c| c.bollinger_multiplier = f64::NAN),
            ("roc_period", |c| c.roc_period = 0),
            ("atr_period", |c| c.atr_period = 0),
        ];
        for (field, mutate) in cases {
            let mut config = FeatureConfig::default();
            mutate(&mut config);
            let err = config.validate().unwrap_err();
            assert!(
                matches!(&err, FeatureError::InvalidConfig(msg) if msg.contains(field)),
                "{field}: unexpected {err}"
            );
        }
    }

    #[test]
    fn add_indicators_reports_invalid_config() {
        let config = FeatureConfig {
            bollinger_period: 1,
            ..FeatureConfig::default()
        };
        let err = add_indicators(&trending_prices(60), &config).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidConfig(_)));
    }
}
