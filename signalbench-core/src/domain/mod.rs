//! Domain types for SignalBench

pub mod bar;
pub mod series;
pub mod signal;

pub use bar::Bar;
pub use series::PriceSeries;
pub use signal::{SignalSeries, FLAT, LONG, SHORT};
