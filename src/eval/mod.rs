//! Evaluation and the comparison report
//!
//! Confusion matrix and per-class precision/recall/F1 with macro and
//! weighted aggregates, reduced per model into the serializable comparison
//! artifact.

use crate::error::{GasmonError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// C×C confusion counts; rows are true classes, columns predicted, both in
/// the fixed class ordering.
pub fn confusion_matrix(
    y_true: &Array1<usize>,
    y_pred: &Array1<usize>,
    n_classes: usize,
) -> Vec<Vec<u64>> {
    let mut matrix = vec![vec![0u64; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        matrix[t][p] += 1;
    }
    matrix
}

/// Per-class precision/recall/F1/support plus macro and weighted aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<String>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub f1: Vec<f64>,
    pub support: Vec<u64>,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
}

/// Compute the classification report from true vs. predicted class indices.
pub fn classification_report(
    y_true: &Array1<usize>,
    y_pred: &Array1<usize>,
    classes: &[String],
) -> ClassificationReport {
    let n_classes = classes.len();
    let matrix = confusion_matrix(y_true, y_pred, n_classes);

    let mut precision = Vec::with_capacity(n_classes);
    let mut recall = Vec::with_capacity(n_classes);
    let mut f1 = Vec::with_capacity(n_classes);
    let mut support = Vec::with_capacity(n_classes);

    for class in 0..n_classes {
        let tp = matrix[class][class] as f64;
        let predicted: f64 = (0..n_classes).map(|row| matrix[row][class] as f64).sum();
        let actual: f64 = matrix[class].iter().map(|&v| v as f64).sum();

        let p = if predicted > 0.0 { tp / predicted } else { 0.0 };
        let r = if actual > 0.0 { tp / actual } else { 0.0 };
        let f = if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        };

        precision.push(p);
        recall.push(r);
        f1.push(f);
        support.push(actual as u64);
    }

    let n = y_true.len() as f64;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count() as f64;

    let k = n_classes as f64;
    let macro_precision = precision.iter().sum::<f64>() / k;
    let macro_recall = recall.iter().sum::<f64>() / k;
    let macro_f1 = f1.iter().sum::<f64>() / k;
    let weighted_f1 = f1
        .iter()
        .zip(support.iter())
        .map(|(f, &s)| f * s as f64)
        .sum::<f64>()
        / n.max(1.0);

    ClassificationReport {
        classes: classes.to_vec(),
        precision,
        recall,
        f1,
        support,
        accuracy: if n > 0.0 { correct / n } else { 0.0 },
        macro_precision,
        macro_recall,
        macro_f1,
        weighted_f1,
    }
}

/// One model's entry in the comparison artifact: macro-F1, class→F1 with the
/// aggregate rows excluded, and the confusion matrix in class order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub macro_f1: f64,
    pub per_class_f1: BTreeMap<String, f64>,
    pub confusion_matrix: Vec<Vec<u64>>,
}

/// Evaluate one model's predictions into its report entry.
pub fn evaluate_model(
    y_true: &Array1<usize>,
    y_pred: &Array1<usize>,
    classes: &[String],
) -> ModelScore {
    let report = classification_report(y_true, y_pred, classes);
    let per_class_f1 = report
        .classes
        .iter()
        .cloned()
        .zip(report.f1.iter().copied())
        .collect();

    ModelScore {
        macro_f1: report.macro_f1,
        per_class_f1,
        confusion_matrix: confusion_matrix(y_true, y_pred, classes.len()),
    }
}

/// Comparison artifact keyed by model name. Key order is deterministic;
/// the report is immutable once written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonReport {
    entries: BTreeMap<String, ModelScore>,
}

impl ComparisonReport {
    pub fn insert(&mut self, model_name: String, score: ModelScore) {
        self.entries.insert(model_name, score);
    }

    pub fn get(&self, model_name: &str) -> Option<&ModelScore> {
        self.entries.get(model_name)
    }

    pub fn models(&self) -> impl Iterator<Item = &String> + '_ {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModelScore)> + '_ {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&json).map_err(GasmonError::from)
    }
}
