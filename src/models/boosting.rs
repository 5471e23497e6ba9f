//! Gradient boosted trees

use super::tree::RegressionTree;
use super::{argmax_rows, softmax_rows, Classifier};
use crate::error::{GasmonError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Configuration for [`GradientBoostedTrees`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbtConfig {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio per tree
    pub subsample: f64,
    /// Column subsample ratio per tree
    pub colsample: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GbtConfig {
    fn default() -> Self {
        Self {
            n_estimators: 400,
            learning_rate: 0.05,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 0.9,
            colsample: 0.9,
            random_state: Some(42),
        }
    }
}

/// One fitted tree plus the column subset it was trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassTree {
    tree: RegressionTree,
    columns: Vec<usize>,
}

/// Multiclass gradient boosting over regression trees.
///
/// Per round, one tree per class fits the softmax log-loss gradient; raw
/// scores accumulate with shrinkage. Sample weights scale each row's
/// gradient contribution, which is how the harness feeds balanced weights
/// through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    config: GbtConfig,
    n_classes: usize,
    init_scores: Vec<f64>,
    rounds: Vec<Vec<ClassTree>>,
    is_fitted: bool,
}

impl GradientBoostedTrees {
    pub fn new(n_classes: usize) -> Self {
        Self::with_config(n_classes, GbtConfig::default())
    }

    pub fn with_config(n_classes: usize, config: GbtConfig) -> Self {
        Self {
            config,
            n_classes,
            init_scores: Vec::new(),
            rounds: Vec::new(),
            is_fitted: false,
        }
    }

    fn raw_scores(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let n = x.nrows();
        let mut scores = Array2::zeros((n, self.n_classes));
        for (class, &init) in self.init_scores.iter().enumerate() {
            for row in 0..n {
                scores[[row, class]] = init;
            }
        }

        for round in &self.rounds {
            for (class, class_tree) in round.iter().enumerate() {
                let x_sub = x.select(Axis(1), &class_tree.columns);
                let pred = class_tree.tree.predict(&x_sub)?;
                for row in 0..n {
                    scores[[row, class]] += self.config.learning_rate * pred[row];
                }
            }
        }

        Ok(scores)
    }

    fn subsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let sample_size = ((n as f64) * self.config.subsample).ceil() as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(sample_size.max(1));
        indices.sort_unstable();
        indices
    }

    fn colsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let sample_size = ((n as f64) * self.config.colsample).ceil() as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(sample_size.max(1));
        indices.sort_unstable();
        indices
    }
}

impl Classifier for GradientBoostedTrees {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        sample_weight: Option<&Array1<f64>>,
    ) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(GasmonError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if let Some(w) = sample_weight {
            if w.len() != n_samples {
                return Err(GasmonError::ShapeError {
                    expected: format!("weight length = {n_samples}"),
                    actual: format!("weight length = {}", w.len()),
                });
            }
        }
        if let Some(&max_label) = y.iter().max() {
            if max_label >= self.n_classes {
                return Err(GasmonError::InvalidInput(format!(
                    "label {max_label} out of range for {} classes",
                    self.n_classes
                )));
            }
        }

        let weights: Array1<f64> = match sample_weight {
            Some(w) => w.clone(),
            None => Array1::ones(n_samples),
        };
        let weight_sum: f64 = weights.sum();

        // Initial scores: weighted class log-priors.
        self.init_scores = {
            let mut class_weight = vec![0.0f64; self.n_classes];
            for (row, &label) in y.iter().enumerate() {
                class_weight[label] += weights[row];
            }
            class_weight
                .into_iter()
                .map(|w| ((w / weight_sum).max(1e-12)).ln())
                .collect()
        };

        let mut onehot = Array2::zeros((n_samples, self.n_classes));
        for (row, &label) in y.iter().enumerate() {
            onehot[[row, label]] = 1.0;
        }

        let mut scores = Array2::zeros((n_samples, self.n_classes));
        for (class, &init) in self.init_scores.iter().enumerate() {
            for row in 0..n_samples {
                scores[[row, class]] = init;
            }
        }

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.rounds = Vec::with_capacity(self.config.n_estimators);

        for _round in 0..self.config.n_estimators {
            let probs = softmax_rows(&scores);
            let mut round_trees = Vec::with_capacity(self.n_classes);

            for class in 0..self.n_classes {
                // Weighted log-loss gradient for this class.
                let residuals: Array1<f64> = (0..n_samples)
                    .map(|row| weights[row] * (onehot[[row, class]] - probs[[row, class]]))
                    .collect();

                let row_indices = self.subsample_indices(n_samples, &mut rng);
                let col_indices = self.colsample_indices(n_features, &mut rng);

                let x_rows = x.select(Axis(0), &row_indices);
                let x_sub = x_rows.select(Axis(1), &col_indices);
                let y_sub: Array1<f64> =
                    row_indices.iter().map(|&i| residuals[i]).collect();

                let mut tree = RegressionTree::new()
                    .with_max_depth(self.config.max_depth)
                    .with_min_samples_leaf(self.config.min_samples_leaf);
                tree.fit(&x_sub, &y_sub)?;

                // Update scores over all rows so the next round's gradient
                // sees the full ensemble.
                let x_all = x.select(Axis(1), &col_indices);
                let pred = tree.predict(&x_all)?;
                for row in 0..n_samples {
                    scores[[row, class]] += self.config.learning_rate * pred[row];
                }

                round_trees.push(ClassTree {
                    tree,
                    columns: col_indices,
                });
            }

            self.rounds.push(round_trees);
        }

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
        Ok(softmax_rows(&self.raw_scores(x)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GbtConfig {
        GbtConfig {
            n_estimators: 20,
            max_depth: 3,
            learning_rate: 0.2,
            ..Default::default()
        }
    }

    fn three_band_data() -> (Array2<f64>, Array1<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            let v = i as f64 / 10.0;
            rows.extend([v, (i % 5) as f64]);
            labels.push(if v < 2.0 {
                0
            } else if v < 4.0 {
                1
            } else {
                2
            });
        }
        (
            Array2::from_shape_vec((60, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_learns_three_bands() {
        let (x, y) = three_band_data();
        let mut model = GradientBoostedTrees::with_config(3, small_config());
        model.fit(&x, &y, None).unwrap();

        let pred = model.predict(&x).unwrap();
        let correct = pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(
            correct as f64 / y.len() as f64 > 0.9,
            "accuracy too low: {correct}/60"
        );
    }

    #[test]
    fn test_proba_shape_and_normalization() {
        let (x, y) = three_band_data();
        let mut model = GradientBoostedTrees::with_config(3, small_config());
        model.fit(&x, &y, None).unwrap();

        let probs = model.predict_proba(&x).unwrap();
        assert_eq!(probs.nrows(), 60);
        assert_eq!(probs.ncols(), 3);
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_accepts_sample_weights() {
        let (x, y) = three_band_data();
        let weights = super::super::balanced_sample_weights(&y, 3);
        let mut model = GradientBoostedTrees::with_config(3, small_config());
        model.fit(&x, &y, Some(&weights)).unwrap();
        assert_eq!(model.predict(&x).unwrap().len(), 60);
    }

    #[test]
    fn test_deterministic_given_seed() {
        let (x, y) = three_band_data();

        let mut a = GradientBoostedTrees::with_config(3, small_config());
        a.fit(&x, &y, None).unwrap();
        let mut b = GradientBoostedTrees::with_config(3, small_config());
        b.fit(&x, &y, None).unwrap();

        let pa = a.predict_proba(&x).unwrap();
        let pb = b.predict_proba(&x).unwrap();
        for (va, vb) in pa.iter().zip(pb.iter()) {
            assert!((va - vb).abs() < 1e-12);
        }
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let model = GradientBoostedTrees::new(3);
        let x = Array2::zeros((1, 2));
        assert!(matches!(
            model.predict(&x).unwrap_err(),
            GasmonError::ModelNotFitted
        ));
    }

    #[test]
    fn test_weight_length_mismatch_rejected() {
        let (x, y) = three_band_data();
        let bad = Array1::ones(3);
        let mut model = GradientBoostedTrees::with_config(3, small_config());
        assert!(matches!(
            model.fit(&x, &y, Some(&bad)).unwrap_err(),
            GasmonError::ShapeError { .. }
        ));
    }
}
