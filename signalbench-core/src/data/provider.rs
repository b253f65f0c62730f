//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV import)
//! so we can swap implementations and mock for tests.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, PriceSeries};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for '{symbol}' between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("csv import failed: {0}")]
    Csv(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unsupported interval '{0}' (expected 1d, 1wk or 1mo)")]
    UnsupportedInterval(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Bar interval requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }

    /// Bars per year, used to annualize statistics.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Interval::Daily => 252.0,
            Interval::Weekly => 52.0,
            Interval::Monthly => 12.0,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Interval::Daily),
            "1wk" => Ok(Interval::Weekly),
            "1mo" => Ok(Interval::Monthly),
            other => Err(DataError::UnsupportedInterval(other.to_string())),
        }
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Memory,
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Trait for data providers (Yahoo Finance, CSV import, etc).
///
/// `start` and `end` are both inclusive. A provider may return an empty bar
/// list; [`load_prices`] turns that into [`DataError::NoData`].
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch OHLCV bars for a symbol over a date range.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<FetchResult, DataError>;
}

/// Fetch and validate a price series, failing with `NoData` when nothing usable remains.
pub fn load_prices(
    provider: &dyn DataProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
) -> Result<PriceSeries, DataError> {
    tracing::info!(
        provider = provider.name(),
        symbol,
        %start,
        %end,
        %interval,
        "loading prices"
    );
    let fetched = provider.fetch(symbol, start, end, interval)?;
    let series = PriceSeries::from_bars(fetched.symbol, fetched.bars)?;
    if series.is_empty() {
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }
    tracing::debug!(symbol, bars = series.len(), source = ?fetched.source, "prices loaded");
    Ok(series)
}

/// In-memory provider serving fixed bars, filtered by date range.
///
/// Useful for tests, benchmarks and callers that already hold the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    series: Vec<(String, Vec<Bar>)>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.series.push((symbol.into(), bars));
        self
    }
}

impl DataProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: Interval,
    ) -> Result<FetchResult, DataError> {
        let bars = self
            .series
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, bars)| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Memory,
        })
    }
}
