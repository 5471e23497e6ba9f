//! Multi-layer perceptron classifier

use super::{argmax_rows, softmax_rows, Classifier};
use crate::error::{GasmonError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Hidden-layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    Sigmoid,
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Self::ReLU
    }
}

/// Configuration for [`MlpClassifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
    /// Hidden activation
    pub activation: Activation,
    /// Learning rate
    pub learning_rate: f64,
    /// Number of epochs
    pub max_epochs: usize,
    /// Minibatch size
    pub batch_size: usize,
    /// L2 regularization
    pub alpha: f64,
    /// Momentum
    pub momentum: f64,
    /// Stop after this many epochs without training-loss improvement
    pub early_stopping_patience: usize,
    /// Minimum loss improvement that resets the patience counter
    pub tol: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![128, 64],
            activation: Activation::ReLU,
            learning_rate: 1e-3,
            max_epochs: 300,
            batch_size: 256,
            alpha: 1e-4,
            momentum: 0.9,
            early_stopping_patience: 10,
            tol: 1e-4,
            random_state: Some(42),
        }
    }
}

/// Feedforward network with a softmax output layer, trained by minibatch
/// gradient descent with momentum.
///
/// Receives no class-balancing signal, by policy, unlike the other model
/// families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    config: MlpConfig,
    n_classes: usize,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    is_fitted: bool,
}

impl MlpClassifier {
    pub fn new(n_classes: usize) -> Self {
        Self::with_config(n_classes, MlpConfig::default())
    }

    pub fn with_config(n_classes: usize, config: MlpConfig) -> Self {
        Self {
            config,
            n_classes,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
            is_fitted: false,
        }
    }

    fn seeded_rng(&self) -> Xoshiro256PlusPlus {
        match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        }
    }

    fn initialize_layers(&mut self) {
        self.weights.clear();
        self.biases.clear();

        let mut rng = self.seeded_rng();

        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(self.n_classes);

        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);

            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let values: Vec<f64> = (0..n_in * n_out)
                .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
                .collect();

            self.weights
                .push(Array2::from_shape_vec((n_in, n_out), values).expect("layer shape"));
            self.biases.push(Array1::zeros(n_out));
        }
    }

    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let mut activations = vec![x.clone()];
        let mut pre_activations = Vec::new();

        for (layer, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations.last().expect("input layer").dot(w) + b;
            pre_activations.push(z.clone());

            let a = if layer < self.weights.len() - 1 {
                activate(&z, self.config.activation)
            } else {
                softmax_rows(&z)
            };
            activations.push(a);
        }

        (activations, pre_activations)
    }

    fn backward(
        &self,
        y_onehot: &Array2<f64>,
        activations: &[Array2<f64>],
        pre_activations: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y_onehot.nrows() as f64;
        let mut gradients = Vec::new();

        // Softmax + cross-entropy gradient at the output layer.
        let mut delta = (activations.last().expect("output layer") - y_onehot) / n;

        for layer in (0..self.weights.len()).rev() {
            let a_prev = &activations[layer];
            let grad_w = a_prev.t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            gradients.push((grad_w, grad_b));

            if layer > 0 {
                let z = &pre_activations[layer - 1];
                delta = delta.dot(&self.weights[layer].t())
                    * activate_derivative(z, self.config.activation);
            }
        }

        gradients.reverse();
        gradients
    }

    fn gather_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
        let n_cols = x.ncols();
        let mut rows = Vec::with_capacity(indices.len() * n_cols);
        for &i in indices {
            rows.extend(x.row(i).iter().copied());
        }
        Array2::from_shape_vec((indices.len(), n_cols), rows).expect("gathered shape")
    }

    fn one_hot(&self, y: &Array1<usize>) -> Array2<f64> {
        let mut onehot = Array2::zeros((y.len(), self.n_classes));
        for (row, &label) in y.iter().enumerate() {
            onehot[[row, label]] = 1.0;
        }
        onehot
    }
}

impl Classifier for MlpClassifier {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        sample_weight: Option<&Array1<f64>>,
    ) -> Result<()> {
        if sample_weight.is_some() {
            return Err(GasmonError::InvalidInput(
                "MlpClassifier does not support sample weights".to_string(),
            ));
        }
        if self.config.batch_size == 0 {
            return Err(GasmonError::InvalidInput(
                "batch_size must be at least 1".to_string(),
            ));
        }

        let n_samples = x.nrows();
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

        self.n_features = x.ncols();
        self.initialize_layers();

        let y_onehot = self.one_hot(y);
        let mut rng = self.seeded_rng();

        let mut velocities_w: Vec<Array2<f64>> = self
            .weights
            .iter()
            .map(|w| Array2::zeros(w.raw_dim()))
            .collect();
        let mut velocities_b: Vec<Array1<f64>> = self
            .biases
            .iter()
            .map(|b| Array1::zeros(b.len()))
            .collect();

        let lr = self.config.learning_rate;
        let momentum = self.config.momentum;
        let decay = 1.0 - self.config.alpha * lr;

        let mut best_loss = f64::INFINITY;
        let mut patience_counter = 0usize;

        for _epoch in 0..self.config.max_epochs {
            let mut indices: Vec<usize> = (0..n_samples).collect();
            indices.shuffle(&mut rng);

            let mut epoch_loss = 0.0f64;

            for batch_start in (0..n_samples).step_by(self.config.batch_size) {
                let batch_end = (batch_start + self.config.batch_size).min(n_samples);
                let batch_indices = &indices[batch_start..batch_end];

                let x_batch = Self::gather_rows(x, batch_indices);
                let y_batch = Self::gather_rows(&y_onehot, batch_indices);

                let (activations, pre_activations) = self.forward(&x_batch);
                epoch_loss += cross_entropy(&y_batch, activations.last().expect("output layer"));
                let gradients = self.backward(&y_batch, &activations, &pre_activations);

                for (layer, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    velocities_w[layer] = &velocities_w[layer] * momentum - &grad_w * lr;
                    velocities_b[layer] = &velocities_b[layer] * momentum - &grad_b * lr;

                    self.weights[layer] = &self.weights[layer] + &velocities_w[layer];
                    self.biases[layer] = &self.biases[layer] + &velocities_b[layer];

                    self.weights[layer] = &self.weights[layer] * decay;
                }
            }

            epoch_loss /= n_samples as f64;
            if best_loss - epoch_loss > self.config.tol {
                best_loss = epoch_loss;
                patience_counter = 0;
            } else {
                patience_counter += 1;
                if patience_counter >= self.config.early_stopping_patience {
                    break;
                }
            }
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
        let (activations, _) = self.forward(x);
        Ok(activations.last().expect("output layer").clone())
    }
}

/// Summed cross-entropy of one-hot targets against predicted probabilities.
fn cross_entropy(y_onehot: &Array2<f64>, probs: &Array2<f64>) -> f64 {
    y_onehot
        .iter()
        .zip(probs.iter())
        .filter(|(y, _)| **y > 0.0)
        .map(|(_, p)| -(p.max(1e-12)).ln())
        .sum()
}

fn activate(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| v.max(0.0)),
        Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => z.mapv(|v| v.tanh()),
    }
}

fn activate_derivative(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
        Activation::Sigmoid => {
            let sig = activate(z, Activation::Sigmoid);
            &sig * &(1.0 - &sig)
        }
        Activation::Tanh => {
            let t = z.mapv(|v| v.tanh());
            1.0 - &t * &t
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster_data() -> (Array2<f64>, Array1<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let jitter = (i % 7) as f64 * 0.03;
            if i % 2 == 0 {
                rows.extend([-1.0 - jitter, -1.0 + jitter]);
                labels.push(0);
            } else {
                rows.extend([1.0 + jitter, 1.0 - jitter]);
                labels.push(1);
            }
        }
        (
            Array2::from_shape_vec((40, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    fn small_config() -> MlpConfig {
        MlpConfig {
            hidden_layers: vec![16, 8],
            max_epochs: 200,
            learning_rate: 0.01,
            batch_size: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_learns_two_clusters() {
        let (x, y) = two_cluster_data();
        let mut mlp = MlpClassifier::with_config(2, small_config());
        mlp.fit(&x, &y, None).unwrap();

        let pred = mlp.predict(&x).unwrap();
        let correct = pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(
            correct as f64 / y.len() as f64 > 0.9,
            "accuracy too low: {correct}/40"
        );
    }

    #[test]
    fn test_proba_rows_sum_to_one() {
        let (x, y) = two_cluster_data();
        let mut mlp = MlpClassifier::with_config(2, small_config());
        mlp.fit(&x, &y, None).unwrap();

        let probs = mlp.predict_proba(&x).unwrap();
        assert_eq!(probs.ncols(), 2);
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic_given_seed() {
        let (x, y) = two_cluster_data();

        let mut a = MlpClassifier::with_config(2, small_config());
        a.fit(&x, &y, None).unwrap();
        let mut b = MlpClassifier::with_config(2, small_config());
        b.fit(&x, &y, None).unwrap();

        let pa = a.predict_proba(&x).unwrap();
        let pb = b.predict_proba(&x).unwrap();
        for (va, vb) in pa.iter().zip(pb.iter()) {
            assert!((va - vb).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_sample_weights() {
        let (x, y) = two_cluster_data();
        let w = Array1::ones(y.len());
        let mut mlp = MlpClassifier::with_config(2, small_config());
        assert!(matches!(
            mlp.fit(&x, &y, Some(&w)).unwrap_err(),
            GasmonError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let mlp = MlpClassifier::new(2);
        let x = Array2::zeros((1, 2));
        assert!(matches!(
            mlp.predict(&x).unwrap_err(),
            GasmonError::ModelNotFitted
        ));
    }
}
