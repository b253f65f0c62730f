//! Sliding windows over a feature table for sequence models.

use chrono::NaiveDate;

use super::{FeatureError, FeatureTable, StandardScaler};

/// Windows of scaled feature rows with the target at the bar after each window.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBatch {
    /// samples × window × features
    pub tensor: Vec<Vec<Vec<f64>>>,
    /// Target at bar `i` for the window `[i - W, i)`; empty when no target column was given.
    pub targets: Vec<f64>,
    pub feature_names: Vec<String>,
    /// Table row `i` each window predicts.
    pub end_indices: Vec<usize>,
    /// Date of row `i` for each window.
    pub dates: Vec<NaiveDate>,
}

impl SequenceBatch {
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    /// One row per window, time steps concatenated oldest first.
    pub fn flatten(&self) -> Vec<Vec<f64>> {
        self.tensor.iter().map(|w| w.concat()).collect()
    }
}

/// Build one window per bar `i >= window` from the scaled rows `[i - window, i)`.
///
/// The scaler must have been fit beforehand (on training rows only); it is
/// applied here, never re-fit.
pub fn window_for_sequence_model(
    table: &FeatureTable,
    target_column: Option<&str>,
    window: usize,
    scaler: &StandardScaler,
) -> Result<SequenceBatch, FeatureError> {
    assert!(window >= 1, "sequence window must be >= 1");
    if table.len() <= window {
        return Err(FeatureError::InsufficientRows {
            needed: window + 1,
            actual: table.len(),
        });
    }

    let scaled = scaler.transform(&table.feature_matrix())?;
    let target = target_column.map(|name| table.column(name)).transpose()?;

    let mut batch = SequenceBatch {
        tensor: Vec::with_capacity(table.len() - window),
        targets: Vec::new(),
        feature_names: table
            .feature_columns()
            .into_iter()
            .map(String::from)
            .collect(),
        end_indices: Vec::with_capacity(table.len() - window),
        dates: Vec::with_capacity(table.len() - window),
    };
    for i in window..table.len() {
        batch.tensor.push(scaled[i - window..i].to_vec());
        if let Some(target) = target {
            batch.targets.push(target[i]);
        }
        batch.end_indices.push(i);
        batch.dates.push(table.dates()[i]);
    }

    tracing::debug!(
        samples = batch.len(),
        window,
        features = batch.feature_names.len(),
        "sequence windows built"
    );
    Ok(batch)
}
