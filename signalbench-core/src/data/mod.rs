//! Market data: the provider contract plus Yahoo Finance and CSV adapters.

pub mod csv;
pub mod provider;
pub mod yahoo;

pub use self::csv::CsvProvider;
pub use provider::{
    load_prices, DataError, DataProvider, DataSource, FetchResult, Interval, MemoryProvider,
};
pub use yahoo::YahooProvider;
