//! Classifier implementations and the model-comparison harness
//!
//! Models are tagged implementations of one capability interface, not an
//! inheritance chain: fit with optional sample weights, predict class
//! indices, and expose class probabilities.

mod boosting;
mod harness;
mod linear;
mod neural;
mod tree;

pub use boosting::{GbtConfig, GradientBoostedTrees};
pub use harness::{default_models, ModelEntry, ModelHarness, ModelSpec, WeightPolicy};
pub use linear::{SoftmaxConfig, SoftmaxRegression};
pub use neural::{Activation, MlpClassifier, MlpConfig};
pub use tree::RegressionTree;

use crate::error::{GasmonError, Result};
use ndarray::{Array1, Array2};

/// Capability interface for classification models.
///
/// Labels are 0-based class indices. `sample_weight` is optional; a model
/// that cannot honor weights must reject them rather than ignore them.
pub trait Classifier: Send + Sync {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        sample_weight: Option<&Array1<f64>>,
    ) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>>;

    /// Per-class probabilities, rows summing to one.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;
}

/// Maps string labels to dense 0-based class indices. Classes are the sorted
/// distinct labels seen at fit time; the ordering fixes the confusion-matrix
/// layout and the report keys.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit(labels: &[String]) -> Self {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn transform(&self, labels: &[String]) -> Result<Array1<usize>> {
        labels
            .iter()
            .map(|label| {
                self.classes
                    .binary_search(label)
                    .map_err(|_| GasmonError::ValidationError(format!("unseen label \"{label}\"")))
            })
            .collect::<Result<Vec<usize>>>()
            .map(Array1::from_vec)
    }

    pub fn inverse(&self, indices: &Array1<usize>) -> Vec<String> {
        indices
            .iter()
            .map(|&idx| self.classes[idx].clone())
            .collect()
    }
}

/// Balanced sample weights from the training label distribution:
/// w_i = n / (k · n_class(i)). Classes with fewer members get proportionally
/// heavier rows.
pub fn balanced_sample_weights(y: &Array1<usize>, n_classes: usize) -> Array1<f64> {
    let n = y.len() as f64;
    let mut counts = vec![0usize; n_classes];
    for &label in y.iter() {
        counts[label] += 1;
    }

    y.iter()
        .map(|&label| {
            let class_n = counts[label].max(1) as f64;
            n / (n_classes as f64 * class_n)
        })
        .collect()
}

/// Numerically stable row-wise softmax, shared by the model families.
pub(crate) fn softmax_rows(scores: &Array2<f64>) -> Array2<f64> {
    let mut result = scores.clone();
    for mut row in result.rows_mut() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp_sum: f64 = row.iter().map(|&v| (v - max).exp()).sum();
        for v in row.iter_mut() {
            *v = (*v - max).exp() / exp_sum;
        }
    }
    result
}

/// Row-wise argmax over a probability/score matrix.
pub(crate) fn argmax_rows(scores: &Array2<f64>) -> Array1<usize> {
    scores
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(idx, _)| idx)
                .unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_label_encoder_sorted_classes() {
        let labels: Vec<String> = ["Moderate", "Low", "High", "Low"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let encoder = LabelEncoder::fit(&labels);
        assert_eq!(encoder.classes(), &["High", "Low", "Moderate"]);

        let encoded = encoder.transform(&labels).unwrap();
        assert_eq!(encoded, array![2, 1, 0, 1]);

        let decoded = encoder.inverse(&encoded);
        assert_eq!(decoded, labels);
    }

    #[test]
    fn test_label_encoder_rejects_unseen() {
        let labels: Vec<String> = vec!["Low".to_string(), "High".to_string()];
        let encoder = LabelEncoder::fit(&labels);
        assert!(encoder.transform(&["Sleeping".to_string()]).is_err());
    }

    #[test]
    fn test_balanced_weights_favor_minority() {
        let y = array![0, 0, 0, 0, 1, 1];
        let w = balanced_sample_weights(&y, 2);

        // Majority rows: 6 / (2·4); minority rows: 6 / (2·2).
        assert!((w[0] - 0.75).abs() < 1e-12);
        assert!((w[4] - 1.5).abs() < 1e-12);

        // Total weight per class is equal.
        let class0: f64 = (0..4).map(|i| w[i]).sum();
        let class1: f64 = (4..6).map(|i| w[i]).sum();
        assert!((class0 - class1).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let scores = array![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]];
        let probs = softmax_rows(&scores);
        for row in probs.rows() {
            let sum: f64 = row.sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert!((probs[[1, 0]] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_rows() {
        let scores = array![[0.1, 0.7, 0.2], [0.9, 0.05, 0.05]];
        assert_eq!(argmax_rows(&scores), array![1, 0]);
    }
}
