//! SignalBench CLI — single and batch backtest commands.
//!
//! Commands:
//! - `run` — train (if needed) and backtest one strategy on one ticker
//! - `batch` — the same run over several tickers, one summary line each

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use signalbench_core::data::{CsvProvider, DataProvider, Interval, YahooProvider};
use signalbench_core::strategy::StrategyConfig;
use signalbench_runner::{run_from_config, run_many, save_artifacts, BacktestConfig};

const STRATEGY_IDS: [&str; 6] = ["sma", "rsi", "momentum", "rf", "lr", "seq"];

#[derive(Parser)]
#[command(
    name = "signalbench",
    about = "SignalBench CLI — trading signal backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy on one ticker and print the summary.
    Run {
        /// Ticker symbol.
        #[arg(long, default_value = "AAPL")]
        ticker: String,

        #[command(flatten)]
        common: CommonArgs,

        /// Directory for equity.csv and summary.json.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Backtest one strategy on several tickers concurrently.
    Batch {
        /// Ticker symbols (e.g., AAPL MSFT SPY).
        #[arg(long, required = true, num_args = 1..)]
        tickers: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Backtest start date (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-01")]
    start: NaiveDate,

    /// Backtest end date (YYYY-MM-DD).
    #[arg(long, default_value = "2023-01-01")]
    end: NaiveDate,

    /// Strategy id: sma, rsi, momentum, rf, lr, seq.
    #[arg(long, default_value = "sma", value_parser = STRATEGY_IDS)]
    strategy: String,

    /// Starting capital.
    #[arg(long, default_value_t = 10_000.0)]
    initial_capital: f64,

    /// Training start date for learned strategies (YYYY-MM-DD).
    #[arg(long, default_value = "2010-01-01")]
    train_start: NaiveDate,

    /// Training end date for learned strategies (YYYY-MM-DD).
    #[arg(long, default_value = "2019-12-31")]
    train_end: NaiveDate,

    /// Bar interval: 1d, 1wk, 1mo.
    #[arg(long, default_value = "1d")]
    interval: Interval,

    /// TOML config file. Replaces all run flags above.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read bars from a CSV file or a directory of {TICKER}.csv files instead of Yahoo.
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() {
    init_tracing();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            ticker,
            common,
            output_dir,
        } => run_single(&ticker, &common, output_dir),
        Commands::Batch { tickers, common } => run_batch(&tickers, &common),
    }
}

fn run_single(ticker: &str, args: &CommonArgs, output_dir: Option<PathBuf>) -> Result<()> {
    let config = build_config(ticker, args)?;
    let provider = build_provider(args)?;

    let result = run_from_config(provider, &config).with_context(|| {
        format!(
            "backtest failed for {} ({})",
            config.backtest.symbol,
            config.strategy.id()
        )
    })?;

    print!("{}", result.format_summary());

    if let Some(dir) = output_dir {
        let written = save_artifacts(&result, &dir)?;
        tracing::info!(files = written.len(), dir = %dir.display(), "run artifacts written");
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn run_batch(tickers: &[String], args: &CommonArgs) -> Result<()> {
    let config = build_config(&tickers[0], args)?;
    let provider = build_provider(args)?;

    tracing::info!(
        tickers = tickers.len(),
        strategy = config.strategy.id(),
        "batch started"
    );
    let results = run_many(provider, &config, tickers);

    println!(
        "{:<8} {:>14} {:>10} {:>8} {:>10}",
        "Ticker", "Final Equity", "Return", "Sharpe", "Max DD"
    );
    println!("{}", "-".repeat(54));
    let mut failures = 0;
    for (ticker, result) in &results {
        match result {
            Ok(r) => println!("{}", r.format_line()),
            Err(e) => {
                failures += 1;
                println!("{ticker:<8} error: {e}");
            }
        }
    }
    tracing::info!(
        succeeded = results.len() - failures,
        failed = failures,
        "batch finished"
    );

    if failures == results.len() {
        anyhow::bail!("all {failures} backtests failed");
    }
    Ok(())
}

/// Config from `--config` when given, from the flags otherwise.
fn build_config(ticker: &str, args: &CommonArgs) -> Result<BacktestConfig> {
    if let Some(path) = &args.config {
        return BacktestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    let mut config = BacktestConfig::new(ticker, args.start, args.end);
    config.backtest.initial_capital = args.initial_capital;
    config.backtest.interval = args.interval;
    config.strategy = StrategyConfig::from_id(&args.strategy)?;
    config.training.start_date = args.train_start;
    config.training.end_date = args.train_end;
    config.validate()?;
    Ok(config)
}

fn build_provider(args: &CommonArgs) -> Result<Arc<dyn DataProvider>> {
    match &args.csv {
        Some(path) => Ok(Arc::new(CsvProvider::from_path(path))),
        None => Ok(Arc::new(
            YahooProvider::new().context("failed to build Yahoo Finance client")?,
        )),
    }
}
