//! Regression tree base learner

use crate::error::{GasmonError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Tree node: either a leaf prediction or an axis-aligned split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// CART regression tree with variance-reduction splits.
///
/// The base learner for the boosted ensemble: it fits residuals, so only the
/// regression criterion is carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    n_features: usize,
}

impl Default for RegressionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Fit the tree to training data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(GasmonError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(GasmonError::ValidationError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0));
        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
    ) -> TreeNode {
        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < self.min_samples_split
            || n_samples <= self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_constant(&y_subset);

        if should_stop {
            return TreeNode::Leaf {
                value: mean(&y_subset),
                n_samples,
            };
        }

        if let Some((best_feature, best_threshold)) = self.find_best_split(x, y, indices) {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, best_feature]] <= best_threshold);

            if left_indices.len() < self.min_samples_leaf
                || right_indices.len() < self.min_samples_leaf
            {
                return TreeNode::Leaf {
                    value: mean(&y_subset),
                    n_samples,
                };
            }

            let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1));
            let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1));

            TreeNode::Split {
                feature_idx: best_feature,
                threshold: best_threshold,
                left,
                right,
                n_samples,
            }
        } else {
            TreeNode::Leaf {
                value: mean(&y_subset),
                n_samples,
            }
        }
    }

    /// Scan every feature for the variance-minimizing threshold, tracking
    /// left/right sums incrementally over the sorted candidate values.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq_sum: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_impurity = total_sq_sum / n - (total_sum / n).powi(2);

        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in 0..x.ncols() {
            // Sort once per feature; sweep thresholds with running sums.
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[[a, feature_idx]]
                    .partial_cmp(&x[[b, feature_idx]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_count = 0usize;
            let mut left_sum = 0.0f64;
            let mut left_sq_sum = 0.0f64;

            for window in 0..order.len() - 1 {
                let idx = order[window];
                let yi = y[idx];
                left_count += 1;
                left_sum += yi;
                left_sq_sum += yi * yi;

                let current = x[[idx, feature_idx]];
                let next = x[[order[window + 1], feature_idx]];
                if current == next {
                    continue;
                }

                let right_count = indices.len() - left_count;
                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                let left_n = left_count as f64;
                let right_n = right_count as f64;
                let right_sum = total_sum - left_sum;
                let right_sq_sum = total_sq_sum - left_sq_sum;

                let left_impurity = left_sq_sum / left_n - (left_sum / left_n).powi(2);
                let right_impurity = right_sq_sum / right_n - (right_sum / right_n).powi(2);
                let weighted = (left_n * left_impurity + right_n * right_impurity) / n;
                let gain = parent_impurity - weighted;

                if gain > best.map_or(0.0, |(_, _, g)| g) {
                    best = Some((feature_idx, (current + next) / 2.0, gain));
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    /// Make predictions.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(GasmonError::ModelNotFitted)?;

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => return *value,
                        TreeNode::Split {
                            feature_idx,
                            threshold,
                            left,
                            right,
                            ..
                        } => {
                            node = if x[[i, *feature_idx]] <= *threshold {
                                left
                            } else {
                                right
                            };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn is_constant(values: &[f64]) -> bool {
    values
        .windows(2)
        .all(|pair| (pair[0] - pair[1]).abs() < 1e-12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_step_function() {
        let x = Array2::from_shape_vec((8, 1), (0..8).map(|i| i as f64).collect()).unwrap();
        let y: Array1<f64> = (0..8).map(|i| if i < 4 { -1.0 } else { 1.0 }).collect();

        let mut tree = RegressionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();

        let pred = tree.predict(&x).unwrap();
        for i in 0..8 {
            assert!((pred[i] - y[i]).abs() < 1e-9, "sample {i}");
        }
    }

    #[test]
    fn test_depth_limit_respected() {
        let x = Array2::from_shape_vec((16, 1), (0..16).map(|i| i as f64).collect()).unwrap();
        let y: Array1<f64> = (0..16).map(|i| i as f64).collect();

        let mut tree = RegressionTree::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        // Depth 1 means a single split: at most two distinct predictions.
        let pred = tree.predict(&x).unwrap();
        let mut distinct: Vec<i64> = pred.iter().map(|v| (v * 1e9) as i64).collect();
        distinct.sort_unstable();
        distinct.dedup();
        assert!(distinct.len() <= 2);
    }

    #[test]
    fn test_constant_target_yields_constant_leaf() {
        let x = Array2::from_shape_vec((4, 2), vec![1.0; 8]).unwrap();
        let y = Array1::from_elem(4, 3.5);

        let mut tree = RegressionTree::new();
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&x).unwrap();
        for v in pred.iter() {
            assert!((v - 3.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let tree = RegressionTree::new();
        let x = Array2::zeros((1, 1));
        assert!(matches!(
            tree.predict(&x).unwrap_err(),
            GasmonError::ModelNotFitted
        ));
    }

    #[test]
    fn test_shape_mismatch_errors() {
        let x = Array2::zeros((3, 1));
        let y = Array1::zeros(2);
        let mut tree = RegressionTree::new();
        assert!(matches!(
            tree.fit(&x, &y).unwrap_err(),
            GasmonError::ShapeError { .. }
        ));
    }
}
