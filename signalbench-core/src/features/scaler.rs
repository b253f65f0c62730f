//! Z-score standardization, fit once and applied many times.

use serde::{Deserialize, Serialize};

use super::FeatureError;

/// Per-column mean/std learned from a training slice.
///
/// Inference rows are only transformed with statistics fit on training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and population standard deviations.
    ///
    /// Columns with zero variance get a scale of 1.0, so they transform to 0.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, FeatureError> {
        let first = rows.first().ok_or(FeatureError::InsufficientRows {
            needed: 1,
            actual: 0,
        })?;
        let width = first.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(FeatureError::ShapeMismatch {
                expected: width,
                actual: bad.len(),
            });
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut scales {
            let std = (*s / n).sqrt();
            *s = if std > 0.0 { std } else { 1.0 };
        }

        Ok(Self { means, scales })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, FeatureError> {
        if row.len() != self.n_features() {
            return Err(FeatureError::ShapeMismatch {
                expected: self.n_features(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, m), s)| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, FeatureError> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}
