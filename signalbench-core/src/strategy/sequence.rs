//! Sequence-window strategy: a predictor over flattened windows of indicator rows.
//!
//! The window ending before bar i (rows `[i - W, i)`) predicts the direction
//! of bar i's next close. Only indicator columns are used; lag features are
//! redundant once the model sees the whole window.

use super::classifier::usable_rows;
use super::{
    class_to_position, direction_labels, split_index, Strategy, StrategyError, Trainable,
    TrainingReport,
};
use crate::domain::{PriceSeries, SignalSeries};
use crate::features::{
    add_indicators, window_for_sequence_model, FeatureConfig, FeatureError, StandardScaler,
};
use crate::predictor::{accuracy, Predictor};

#[derive(Debug, Clone)]
pub struct SequenceStrategy<P: Predictor> {
    name: String,
    predictor: P,
    features: FeatureConfig,
    window: usize,
    train_fraction: f64,
    scaler: Option<StandardScaler>,
}

impl<P: Predictor> SequenceStrategy<P> {
    pub fn new(
        name: impl Into<String>,
        predictor: P,
        features: FeatureConfig,
        window: usize,
        train_fraction: f64,
    ) -> Self {
        assert!(window >= 1, "window must be >= 1");
        assert!(
            train_fraction > 0.0 && train_fraction <= 1.0,
            "train_fraction must be in (0, 1]"
        );
        Self {
            name: name.into(),
            predictor,
            features,
            window,
            train_fraction,
            scaler: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }
}

impl<P: Predictor> Strategy for SequenceStrategy<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.features.indicator_warmup() + self.window
    }

    fn generate_signals(&self, prices: &PriceSeries) -> Result<SignalSeries, StrategyError> {
        let scaler = self
            .scaler
            .as_ref()
            .ok_or_else(|| StrategyError::NotTrained(self.name.clone()))?;

        let table = match add_indicators(prices, &self.features) {
            Ok(table) if table.len() > self.window => Some(table),
            Ok(_) | Err(FeatureError::InsufficientRows { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        let Some(table) = table else {
            tracing::warn!(
                strategy = %self.name,
                bars = prices.len(),
                window = self.window,
                "history shorter than one window, all flat"
            );
            return Ok(SignalSeries::flat(prices.dates()));
        };

        let batch = window_for_sequence_model(&table, None, self.window, scaler)?;
        let positions: Vec<f64> = self
            .predictor
            .predict(&batch.flatten())?
            .into_iter()
            .map(class_to_position)
            .collect();

        tracing::debug!(strategy = %self.name, windows = batch.len(), bars = prices.len(), "signals generated");
        Ok(SignalSeries::align(&prices.dates(), &batch.dates, &positions))
    }
}

impl<P: Predictor> Trainable for SequenceStrategy<P> {
    fn train(&mut self, prices: &PriceSeries) -> Result<TrainingReport, StrategyError> {
        let table = add_indicators(prices, &self.features).map_err(usable_rows)?;
        let labels = direction_labels(table.column("close")?);

        // window i needs rows [i - W, i) and a label at i
        let samples = labels.len().saturating_sub(self.window);
        if samples < 2 {
            return Err(StrategyError::InsufficientData {
                needed: 2,
                actual: samples,
            });
        }
        let split = split_index(samples, self.train_fraction);

        // fit on the rows the training windows cover
        let matrix = table.feature_matrix();
        let scaler = StandardScaler::fit(&matrix[..self.window + split - 1])?;
        let batch = window_for_sequence_model(&table, None, self.window, &scaler)?;

        let mut x = batch.flatten();
        x.truncate(samples);
        let y = &labels[self.window..];
        let (x_train, x_test) = x.split_at(split);
        let (y_train, y_test) = y.split_at(split);

        self.predictor.fit(x_train, y_train)?;
        let train_accuracy = accuracy(y_train, &self.predictor.predict(x_train)?);
        let test_accuracy = if y_test.is_empty() {
            None
        } else {
            Some(accuracy(y_test, &self.predictor.predict(x_test)?))
        };
        self.scaler = Some(scaler);

        let report = TrainingReport {
            strategy: self.name.clone(),
            train_samples: y_train.len(),
            test_samples: y_test.len(),
            train_accuracy,
            test_accuracy,
        };
        tracing::info!(
            strategy = %self.name,
            predictor = self.predictor.name(),
            window = self.window,
            train_samples = report.train_samples,
            test_samples = report.test_samples,
            train_accuracy = report.train_accuracy,
            test_accuracy = ?report.test_accuracy,
            "sequence model trained"
        );
        Ok(report)
    }

    fn is_trained(&self) -> bool {
        self.scaler.is_some()
    }
}
