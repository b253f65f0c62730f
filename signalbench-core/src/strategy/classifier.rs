//! Learned direction classifier over indicator and lag features.
//!
//! Training builds the feature table, labels each row with the direction of
//! the next close, splits chronologically, fits the scaler on the training
//! rows only and then fits the predictor. Signals map predicted classes to
//! long (1) or short (0 → -1); bars without a full feature row stay flat.

use super::{
    class_to_position, direction_labels, split_index, Strategy, StrategyError, Trainable,
    TrainingReport,
};
use crate::domain::{PriceSeries, SignalSeries};
use crate::features::{build_features, FeatureConfig, FeatureError, StandardScaler};
use crate::predictor::{accuracy, Predictor};

/// Fitted state, present only after a successful `train`.
#[derive(Debug, Clone)]
struct Fitted {
    scaler: StandardScaler,
    feature_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LearnedClassifier<P: Predictor> {
    name: String,
    predictor: P,
    features: FeatureConfig,
    train_fraction: f64,
    fitted: Option<Fitted>,
}

impl<P: Predictor> LearnedClassifier<P> {
    pub fn new(
        name: impl Into<String>,
        predictor: P,
        features: FeatureConfig,
        train_fraction: f64,
    ) -> Self {
        assert!(
            train_fraction > 0.0 && train_fraction <= 1.0,
            "train_fraction must be in (0, 1]"
        );
        Self {
            name: name.into(),
            predictor,
            features,
            train_fraction,
            fitted: None,
        }
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Feature columns seen in training, in model-input order.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.feature_names.as_slice())
    }
}

/// Rows too short for any features count as zero usable rows.
pub(crate) fn usable_rows(err: FeatureError) -> StrategyError {
    match err {
        FeatureError::InsufficientRows { .. } => StrategyError::InsufficientData {
            needed: 2,
            actual: 0,
        },
        other => other.into(),
    }
}

impl<P: Predictor> Strategy for LearnedClassifier<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.features.total_warmup()
    }

    fn generate_signals(&self, prices: &PriceSeries) -> Result<SignalSeries, StrategyError> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| StrategyError::NotTrained(self.name.clone()))?;

        let table = match build_features(prices, &self.features) {
            Ok(table) => table,
            // Too little history for a single feature row: nothing to predict.
            Err(FeatureError::InsufficientRows { .. }) => {
                tracing::warn!(strategy = %self.name, bars = prices.len(), "no feature rows, all flat");
                return Ok(SignalSeries::flat(prices.dates()));
            }
            Err(e) => return Err(e.into()),
        };

        let x = fitted.scaler.transform(&table.feature_matrix())?;
        let predicted = self.predictor.predict(&x)?;
        let positions: Vec<f64> = predicted.into_iter().map(class_to_position).collect();

        tracing::debug!(strategy = %self.name, predicted = positions.len(), bars = prices.len(), "signals generated");
        Ok(SignalSeries::align(
            &prices.dates(),
            table.dates(),
            &positions,
        ))
    }
}

impl<P: Predictor> Trainable for LearnedClassifier<P> {
    fn train(&mut self, prices: &PriceSeries) -> Result<TrainingReport, StrategyError> {
        let table = build_features(prices, &self.features).map_err(usable_rows)?;
        let labels = direction_labels(table.column("close")?);
        let rows = labels.len();
        if rows < 2 {
            return Err(StrategyError::InsufficientData {
                needed: 2,
                actual: rows,
            });
        }

        let mut matrix = table.feature_matrix();
        matrix.truncate(rows);
        let split = split_index(rows, self.train_fraction);
        let (x_train, x_test) = matrix.split_at(split);
        let (y_train, y_test) = labels.split_at(split);

        let scaler = StandardScaler::fit(x_train)?;
        let x_train = scaler.transform(x_train)?;
        let x_test = scaler.transform(x_test)?;

        self.predictor.fit(&x_train, y_train)?;
        let train_accuracy = accuracy(y_train, &self.predictor.predict(&x_train)?);
        let test_accuracy = if y_test.is_empty() {
            None
        } else {
            Some(accuracy(y_test, &self.predictor.predict(&x_test)?))
        };

        self.fitted = Some(Fitted {
            scaler,
            feature_names: table
                .feature_columns()
                .into_iter()
                .map(String::from)
                .collect(),
        });

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
            train_samples = report.train_samples,
            test_samples = report.test_samples,
            train_accuracy = report.train_accuracy,
            test_accuracy = ?report.test_accuracy,
            "model trained"
        );
        Ok(report)
    }

    fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FLAT, LONG, SHORT};
    use crate::features::trending_prices;
    use crate::predictor::LogisticRegression;

    fn classifier() -> LearnedClassifier<LogisticRegression> {
        LearnedClassifier::new(
            "logistic",
            LogisticRegression::default(),
            FeatureConfig::default(),
            0.7,
        )
    }

    #[test]
    fn untrained_refuses_signals() {
        let err = classifier()
            .generate_signals(&trending_prices(80))
            .unwrap_err();
        assert!(matches!(err, StrategyError::NotTrained(_)));
    }

    #[test]
    fn train_splits_chronologically() {
        let prices = trending_prices(125);
        let mut strategy = classifier();
        let report = strategy.train(&prices).unwrap();

        // 125 bars - 19 indicator - 6 lag warm-up = 100 rows, last one unlabelled
        assert_eq!(report.train_samples + report.test_samples, 99);
        assert_eq!(report.train_samples, 69);
        assert!(report.test_accuracy.is_some());
        assert!(strategy.is_trained());
        assert_eq!(strategy.feature_names().unwrap().len(), 20);
    }

    #[test]
    fn signals_cover_every_bar() {
        let prices = trending_prices(125);
        let mut strategy = classifier();
        strategy.train(&prices).unwrap();

        let signals = strategy.generate_signals(&prices).unwrap();
        assert_eq!(signals.len(), prices.len());
        let warmup = strategy.warmup_bars();
        assert_eq!(warmup, 25);
        assert!(signals.values()[..warmup].iter().all(|v| *v == FLAT));
        assert!(signals.values()[warmup..]
            .iter()
            .all(|v| *v == LONG || *v == SHORT));
    }

    #[test]
    fn short_history_is_insufficient() {
        let mut strategy = classifier();
        let err = strategy.train(&trending_prices(20)).unwrap_err();
        assert!(matches!(err, StrategyError::InsufficientData { .. }));
        assert!(!strategy.is_trained());
    }

    #[test]
    fn short_inference_window_is_flat() {
        let mut strategy = classifier();
        strategy.train(&trending_prices(125)).unwrap();
        let signals = strategy.generate_signals(&trending_prices(10)).unwrap();
        assert_eq!(signals.active_bars(), 0);
    }
}
