//! Backtest result record and its fixed-format text summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use signalbench_core::data::Interval;
use signalbench_core::engine::ReturnsFrame;
use signalbench_core::strategy::TrainingReport;

use crate::config::RunId;
use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete, immutable result of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Hash of the config that produced this run, when run from a config.
    #[serde(default)]
    pub run_id: Option<RunId>,
    pub symbol: String,
    /// Short command-line id, e.g. `rf`.
    pub strategy_id: String,
    /// Name reported by the strategy, e.g. `random_forest`.
    pub strategy: String,
    pub interval: Interval,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub metrics: PerformanceMetrics,
    /// Present for learned strategies.
    #[serde(default)]
    pub training: Option<TrainingReport>,
    /// BLAKE3 of the price series the run used.
    pub dataset_hash: String,
    pub bar_count: usize,
    pub warmup_bars: usize,
    /// Bars with a non-flat signal.
    pub active_bars: usize,
    pub frame: ReturnsFrame,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything in a [`BacktestResult`] except the per-bar frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub schema_version: u32,
    #[serde(default)]
    pub run_id: Option<RunId>,
    pub symbol: String,
    pub strategy_id: String,
    pub strategy: String,
    pub interval: Interval,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub metrics: PerformanceMetrics,
    #[serde(default)]
    pub training: Option<TrainingReport>,
    pub dataset_hash: String,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub active_bars: usize,
}

impl BacktestResult {
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            schema_version: self.schema_version,
            run_id: self.run_id.clone(),
            symbol: self.symbol.clone(),
            strategy_id: self.strategy_id.clone(),
            strategy: self.strategy.clone(),
            interval: self.interval,
            start_date: self.start_date,
            end_date: self.end_date,
            initial_capital: self.initial_capital,
            final_equity: self.final_equity,
            metrics: self.metrics.clone(),
            training: self.training.clone(),
            dataset_hash: self.dataset_hash.clone(),
            bar_count: self.bar_count,
            warmup_bars: self.warmup_bars,
            active_bars: self.active_bars,
        }
    }

    /// Fixed-format console summary.
    pub fn format_summary(&self) -> String {
        let rule = "=".repeat(40);
        let m = &self.metrics;
        let mut out = String::with_capacity(512);
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!(
            "Backtest Results for {} ({})\n",
            self.symbol,
            self.strategy_id.to_uppercase()
        ));
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!(
            "Initial Capital:   ${}\n",
            format_money(self.initial_capital)
        ));
        out.push_str(&format!(
            "Final Equity:      ${}\n",
            format_money(self.final_equity)
        ));
        out.push_str(&format!("Total Return:      {:.2}%\n", m.total_return_pct));
        out.push_str(&format!("CAGR:              {:.2}%\n", m.cagr * 100.0));
        out.push_str(&format!("Win Rate:          {:.2}%\n", m.win_rate * 100.0));
        out.push_str(&format!("Sharpe Ratio:      {:.2}\n", m.sharpe));
        out.push_str(&format!("Max Drawdown:      {:.2}%\n", m.max_drawdown * 100.0));
        out.push_str(&format!("Volatility:        {:.2}%\n", m.volatility * 100.0));
        out.push_str(&rule);
        out.push('\n');
        out
    }

    /// One line for batch output.
    pub fn format_line(&self) -> String {
        format!(
            "{:<8} {:>14} {:>9.2}% {:>8.2} {:>9.2}%",
            self.symbol,
            format_money(self.final_equity),
            self.metrics.total_return_pct,
            self.metrics.sharpe,
            self.metrics.max_drawdown * 100.0
        )
    }
}

/// Two decimals with thousands separators: 12345.678 → "12,345.68".
pub fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
pub(crate) fn sample_result() -> BacktestResult {
    use signalbench_core::domain::{Bar, PriceSeries, SignalSeries, LONG};
    use signalbench_core::engine::simulate;

    use crate::metrics::MetricsConfig;

    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = [100.0, 110.0, 99.0, 104.0]
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(base + chrono::Duration::days(i as i64), c, c, c, c, 1.0))
        .collect();
    let prices = PriceSeries::from_bars("SPY", bars).unwrap();
    let signals = SignalSeries::new(prices.dates(), vec![LONG; 4]);
    let frame = simulate(&prices, &signals, 10_000.0).unwrap();
    let metrics = PerformanceMetrics::compute(
        &frame.strategy_returns(),
        &frame.cumulative_strategy(),
        &MetricsConfig::default(),
    );
    BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: None,
        symbol: "SPY".into(),
        strategy_id: "sma".into(),
        strategy: "sma_crossover".into(),
        interval: Interval::Daily,
        start_date: base,
        end_date: base + chrono::Duration::days(3),
        initial_capital: 10_000.0,
        final_equity: frame.final_equity(),
        metrics,
        training: None,
        dataset_hash: prices.content_hash(),
        bar_count: prices.len(),
        warmup_bars: 0,
        active_bars: 4,
        frame,
    }
}
