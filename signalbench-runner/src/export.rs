//! Artifact export — equity curve CSV and JSON summaries.
//!
//! A run's artifact set is two files written into an output directory:
//! - `equity.csv` — one row per simulated bar
//! - `summary.json` — the result record without the per-bar frame
//!
//! Persisted JSON carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::result::{BacktestResult, ResultSummary, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a full `BacktestResult` (including the frame) to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    check_schema(result.schema_version)?;
    Ok(result)
}

/// Serialize the frame-less summary to pretty JSON.
pub fn export_summary_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(&result.summary()).context("failed to serialize summary to JSON")
}

pub fn import_summary_json(json: &str) -> Result<ResultSummary> {
    let summary: ResultSummary =
        serde_json::from_str(json).context("failed to deserialize summary from JSON")?;
    check_schema(summary.schema_version)?;
    Ok(summary)
}

fn check_schema(version: u32) -> Result<()> {
    if version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            version,
            SCHEMA_VERSION
        );
    }
    Ok(())
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the per-bar frame as CSV.
///
/// Columns: date, close, signal, position, market_return, strategy_return,
/// cumulative_market, cumulative_strategy, equity
pub fn export_equity_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "close",
        "signal",
        "position",
        "market_return",
        "strategy_return",
        "cumulative_market",
        "cumulative_strategy",
        "equity",
    ])?;
    for row in result.frame.rows() {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            format!("{:.4}", row.close),
            format!("{}", row.signal),
            format!("{}", row.position),
            format!("{:.8}", row.market_return),
            format!("{:.8}", row.strategy_return),
            format!("{:.8}", row.cumulative_market),
            format!("{:.8}", row.cumulative_strategy),
            format!("{:.2}", row.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `equity.csv` and `summary.json` into `output_dir`, creating it if needed.
///
/// Returns the paths written.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    let equity_path = output_dir.join("equity.csv");
    std::fs::write(&equity_path, export_equity_csv(result)?)
        .with_context(|| format!("failed to write {}", equity_path.display()))?;

    let summary_path = output_dir.join("summary.json");
    std::fs::write(&summary_path, export_summary_json(result)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    tracing::info!(dir = %output_dir.display(), symbol = %result.symbol, "artifacts saved");
    Ok(vec![equity_path, summary_path])
}

/// Load the summary from an artifact directory.
pub fn load_summary(dir: &Path) -> Result<ResultSummary> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}
