//! CSV file provider.
//!
//! Reads OHLCV files with a header row (`Date,Open,High,Low,Close,Volume`,
//! matched case-insensitively; extra columns are ignored). Every column is
//! read as text and cast non-strictly, so malformed numbers become NaN and
//! the row is dropped by the series constructor.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;

use super::provider::{DataError, DataProvider, DataSource, FetchResult, Interval};
use crate::domain::Bar;

const DATE_COLUMNS: [&str; 3] = ["date", "datetime", "timestamp"];
const PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Where the provider looks for files.
#[derive(Debug, Clone)]
enum Location {
    /// One file, served for any symbol.
    File(PathBuf),
    /// A directory of `{SYMBOL}.csv` files.
    Dir(PathBuf),
}

/// Data provider backed by local CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    location: Location,
}

impl CsvProvider {
    /// Serve every symbol from a single file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
        }
    }

    /// Serve `{dir}/{SYMBOL}.csv` for each symbol.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Dir(dir.into()),
        }
    }

    /// File when `path` is a file, directory lookup otherwise.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_file(path)
        }
    }

    fn resolve(&self, symbol: &str) -> PathBuf {
        match &self.location {
            Location::File(path) => path.clone(),
            Location::Dir(dir) => dir.join(format!("{symbol}.csv")),
        }
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<FetchResult, DataError> {
        let path = self.resolve(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if interval != Interval::Daily {
            tracing::debug!(%interval, "csv provider serves bars at file granularity");
        }

        let bars = read_bars(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }
}

/// Read every row of an OHLCV file into bars, in file order.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;

    let date_name = find_column(&df, &DATE_COLUMNS)?;
    let dates = parse_dates(&df, &date_name)?;

    let mut columns = Vec::with_capacity(PRICE_COLUMNS.len());
    for want in PRICE_COLUMNS {
        let name = find_column(&df, &[want])?;
        columns.push(numeric_column(&df, &name)?);
    }

    let bars = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            Bar::new(
                date,
                columns[0][i],
                columns[1][i],
                columns[2][i],
                columns[3][i],
                columns[4][i],
            )
        })
        .collect::<Vec<_>>();

    tracing::debug!(path = %path.display(), rows = bars.len(), "csv read");
    Ok(bars)
}

fn find_column(df: &DataFrame, candidates: &[&str]) -> Result<String, DataError> {
    df.get_column_names()
        .into_iter()
        .find(|name| {
            candidates
                .iter()
                .any(|want| name.as_str().eq_ignore_ascii_case(want))
        })
        .map(|name| name.to_string())
        .ok_or_else(|| DataError::Csv(format!("missing column '{}'", candidates[0])))
}

fn parse_dates(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, DataError> {
    let column = df
        .column(name)
        .map_err(|e| DataError::Csv(format!("date column: {e}")))?;
    let text = column
        .str()
        .map_err(|e| DataError::Csv(format!("date column type: {e}")))?;

    text.into_iter()
        .enumerate()
        .map(|(row, value)| {
            // Accept plain dates and datetimes by reading the YYYY-MM-DD prefix.
            value
                .and_then(|s| s.trim().get(..10))
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .ok_or_else(|| {
                    DataError::Validation(format!("row {}: unparseable date {value:?}", row + 1))
                })
        })
        .collect()
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, DataError> {
    let cast = df
        .column(name)
        .and_then(|c| c.cast(&DataType::Float64))
        .map_err(|e| DataError::Csv(format!("column '{name}': {e}")))?;
    let values = cast
        .f64()
        .map_err(|e| DataError::Csv(format!("column '{name}' type: {e}")))?;
    Ok(values
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    const BODY: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
        2024-01-02,100,101,99,100.5,100.5,1000\n\
        2024-01-03,100.5,102,100,101.5,101.5,1200\n\
        2024-01-04,101.5,103,n/a,102.5,102.5,900\n\
        2024-01-05 00:00:00-05:00,102.5,104,102,103.5,103.5,1100\n";

    #[test]
    fn reads_bars_and_marks_bad_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "SPY.csv", BODY);
        let bars = read_bars(&path).unwrap();
        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].close, 100.5);
        assert!(bars[2].is_void());
        assert_eq!(bars[3].date, d(5));
    }

    #[test]
    fn dir_provider_filters_inclusive_range() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "SPY.csv", BODY);
        let provider = CsvProvider::from_dir(dir.path());
        let result = provider.fetch("SPY", d(3), d(5), Interval::Daily).unwrap();
        assert_eq!(result.bars.len(), 3);
        assert_eq!(result.source, DataSource::CsvImport);
    }

    #[test]
    fn missing_file_is_symbol_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvProvider::from_dir(dir.path());
        let err = provider.fetch("QQQ", d(1), d(5), Interval::Daily).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "Date,Open,Close\n2024-01-02,1,2\n");
        let err = read_bars(&path).unwrap_err();
        assert!(err.to_string().contains("high"));
    }
}
