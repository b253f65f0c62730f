//! Logistic regression fit by batch gradient descent on log loss.

use super::{check_training_set, check_width, Predictor, PredictorError};

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    learning_rate: f64,
    max_iter: usize,
    tolerance: f64,
    weights: Option<Vec<f64>>,
    bias: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(0.1, 1000, 1e-6)
    }
}

impl LogisticRegression {
    pub fn new(learning_rate: f64, max_iter: usize, tolerance: f64) -> Self {
        assert!(learning_rate > 0.0, "learning rate must be positive");
        Self {
            learning_rate,
            max_iter,
            tolerance,
            weights: None,
            bias: 0.0,
        }
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let exp_z = z.exp();
            exp_z / (1.0 + exp_z)
        }
    }

    fn linear(weights: &[f64], bias: f64, row: &[f64]) -> f64 {
        row.iter().zip(weights).map(|(x, w)| x * w).sum::<f64>() + bias
    }

    fn log_loss(y: &[u8], p: &[f64]) -> f64 {
        let eps = 1e-15;
        -y.iter()
            .zip(p)
            .map(|(&label, &prob)| {
                let prob = prob.clamp(eps, 1.0 - eps);
                let label = f64::from(label);
                label * prob.ln() + (1.0 - label) * (1.0 - prob).ln()
            })
            .sum::<f64>()
            / y.len() as f64
    }

    /// Probability of label 1 per row.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, PredictorError> {
        let weights = self
            .weights
            .as_deref()
            .ok_or_else(|| PredictorError::NotFitted(self.name().to_string()))?;
        check_width(x, weights.len())?;
        Ok(x
            .iter()
            .map(|row| Self::sigmoid(Self::linear(weights, self.bias, row)))
            .collect())
    }
}

impl Predictor for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<(), PredictorError> {
        let n_features = check_training_set(x, y)?;
        let n = x.len() as f64;

        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;
        let mut prev_cost = f64::INFINITY;

        for iter in 0..self.max_iter {
            let probs: Vec<f64> = x
                .iter()
                .map(|row| Self::sigmoid(Self::linear(&weights, bias, row)))
                .collect();

            let mut dw = vec![0.0; n_features];
            let mut db = 0.0;
            for ((row, &label), p) in x.iter().zip(y).zip(&probs) {
                let err = p - f64::from(label);
                for (g, v) in dw.iter_mut().zip(row) {
                    *g += err * v;
                }
                db += err;
            }
            for (w, g) in weights.iter_mut().zip(&dw) {
                *w -= self.learning_rate * g / n;
            }
            bias -= self.learning_rate * db / n;

            let cost = Self::log_loss(y, &probs);
            if (prev_cost - cost).abs() < self.tolerance {
                tracing::debug!(iter, cost, "logistic regression converged");
                break;
            }
            prev_cost = cost;
        }

        self.weights = Some(weights);
        self.bias = bias;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>, PredictorError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p >= 0.5))
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::separable_dataset;

    #[test]
    fn predict_before_fit_fails() {
        let model = LogisticRegression::default();
        assert!(!model.is_fitted());
        assert!(matches!(
            model.predict(&[vec![1.0]]),
            Err(PredictorError::NotFitted(_))
        ));
    }

    #[test]
    fn learns_separable_data() {
        let (x, y) = separable_dataset(200);
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        let correct = pred.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.9, "accuracy too low: {correct}");
        assert!(model.weights().unwrap()[0] > 0.0);
    }

    #[test]
    fn fit_is_deterministic() {
        let (x, y) = separable_dataset(50);
        let mut a = LogisticRegression::default();
        let mut b = LogisticRegression::default();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.weights(), b.weights());
    }

    #[test]
    fn wrong_width_at_predict() {
        let (x, y) = separable_dataset(20);
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        assert!(matches!(
            model.predict(&[vec![1.0]]),
            Err(PredictorError::ShapeMismatch { .. })
        ));
    }
}
