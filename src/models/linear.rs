//! Multinomial logistic regression

use super::{argmax_rows, softmax_rows, Classifier};
use crate::error::{GasmonError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for [`SoftmaxRegression`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxConfig {
    /// Maximum gradient-descent iterations
    pub max_iter: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// L2 regularization strength
    pub alpha: f64,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Fold balanced class weights into the gradient
    pub balanced: bool,
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            learning_rate: 0.1,
            alpha: 1e-4,
            tol: 1e-6,
            balanced: true,
        }
    }
}

/// Multinomial logistic regression trained with full-batch gradient descent.
///
/// Class imbalance is corrected internally: with `balanced` set, each row's
/// gradient contribution is weighted by n / (k · n_class). External sample
/// weights are rejected; balancing happens internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    config: SoftmaxConfig,
    n_classes: usize,
    weights: Option<Array2<f64>>,
    intercept: Option<Array1<f64>>,
    is_fitted: bool,
}

impl SoftmaxRegression {
    pub fn new(n_classes: usize) -> Self {
        Self::with_config(n_classes, SoftmaxConfig::default())
    }

    pub fn with_config(n_classes: usize, config: SoftmaxConfig) -> Self {
        Self {
            config,
            n_classes,
            weights: None,
            intercept: None,
            is_fitted: false,
        }
    }

    fn one_hot(&self, y: &Array1<usize>) -> Array2<f64> {
        let mut onehot = Array2::zeros((y.len(), self.n_classes));
        for (row, &label) in y.iter().enumerate() {
            onehot[[row, label]] = 1.0;
        }
        onehot
    }

    fn row_weights(&self, y: &Array1<usize>) -> Array1<f64> {
        if !self.config.balanced {
            return Array1::ones(y.len());
        }
        super::balanced_sample_weights(y, self.n_classes)
    }

    fn scores(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let weights = self.weights.as_ref().ok_or(GasmonError::ModelNotFitted)?;
        let intercept = self.intercept.as_ref().ok_or(GasmonError::ModelNotFitted)?;
        Ok(x.dot(weights) + intercept)
    }
}

impl Classifier for SoftmaxRegression {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        sample_weight: Option<&Array1<f64>>,
    ) -> Result<()> {
        if sample_weight.is_some() {
            return Err(GasmonError::InvalidInput(
                "SoftmaxRegression balances classes internally and takes no sample weights"
                    .to_string(),
            ));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(GasmonError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if let Some(&max_label) = y.iter().max() {
            if max_label >= self.n_classes {
                return Err(GasmonError::InvalidInput(format!(
                    "label {max_label} out of range for {} classes",
                    self.n_classes
                )));
            }
        }

        let y_onehot = self.one_hot(y);
        let row_weights = self.row_weights(y);
        let weight_sum: f64 = row_weights.sum();

        let mut weights: Array2<f64> = Array2::zeros((n_features, self.n_classes));
        let mut intercept: Array1<f64> = Array1::zeros(self.n_classes);

        let lr = self.config.learning_rate;
        let alpha = self.config.alpha;

        for _iter in 0..self.config.max_iter {
            let scores = x.dot(&weights) + &intercept;
            let probs = softmax_rows(&scores);

            // Row-weighted log-loss gradient.
            let mut errors = &probs - &y_onehot;
            for (mut row, &w) in errors.rows_mut().into_iter().zip(row_weights.iter()) {
                row *= w;
            }

            let dw = x.t().dot(&errors) / weight_sum + alpha * &weights;
            let db = errors.sum_axis(Axis(0)) / weight_sum;

            let grad_norm =
                (dw.iter().map(|v| v * v).sum::<f64>() + db.iter().map(|v| v * v).sum::<f64>())
                    .sqrt();
            if grad_norm < self.config.tol {
                break;
            }

            weights = weights - lr * &dw;
            intercept = intercept - lr * &db;
        }

        self.weights = Some(weights);
        self.intercept = Some(intercept);
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(argmax_rows(&self.predict_proba(x)?))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(GasmonError::ModelNotFitted);
        }
        Ok(softmax_rows(&self.scores(x)?))
    }
}
