//! Model comparison harness

use super::{
    balanced_sample_weights, Classifier, GbtConfig, GradientBoostedTrees, LabelEncoder,
    MlpClassifier, MlpConfig, SoftmaxConfig, SoftmaxRegression,
};
use crate::error::{GasmonError, Result};
use crate::eval::{evaluate_model, ComparisonReport, ModelScore};
use crate::preprocessing::{ClassConditionalImputer, ColumnRouter, FeaturePlan};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How a model receives its class-imbalance correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightPolicy {
    /// Explicit balanced sample weights computed from the training labels
    BalancedSampleWeights,
    /// The model folds class weights into its own objective
    InternalClassWeights,
    /// No balancing signal at all
    Unweighted,
}

/// Which classifier family to instantiate, with its configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelSpec {
    Linear(SoftmaxConfig),
    Neural(MlpConfig),
    TreeEnsemble(GbtConfig),
}

impl ModelSpec {
    fn build(&self, n_classes: usize) -> Box<dyn Classifier> {
        match self {
            ModelSpec::Linear(config) => {
                Box::new(SoftmaxRegression::with_config(n_classes, config.clone()))
            }
            ModelSpec::Neural(config) => {
                Box::new(MlpClassifier::with_config(n_classes, config.clone()))
            }
            ModelSpec::TreeEnsemble(config) => {
                Box::new(GradientBoostedTrees::with_config(n_classes, config.clone()))
            }
        }
    }

    /// Sample-weighting policy per family. The tree ensemble takes explicit
    /// balanced weights; the linear model balances internally; the neural
    /// net receives nothing.
    pub fn weight_policy(&self) -> WeightPolicy {
        match self {
            ModelSpec::Linear(_) => WeightPolicy::InternalClassWeights,
            ModelSpec::Neural(_) => WeightPolicy::Unweighted,
            ModelSpec::TreeEnsemble(_) => WeightPolicy::BalancedSampleWeights,
        }
    }
}

/// A named model slot in the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub spec: ModelSpec,
}

/// The fixed three-family comparison set, all seeded from the pipeline seed.
pub fn default_models(seed: u64) -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            name: "logreg".to_string(),
            spec: ModelSpec::Linear(SoftmaxConfig::default()),
        },
        ModelEntry {
            name: "mlp".to_string(),
            spec: ModelSpec::Neural(MlpConfig {
                random_state: Some(seed),
                ..Default::default()
            }),
        },
        ModelEntry {
            name: "gbt".to_string(),
            spec: ModelSpec::TreeEnsemble(GbtConfig {
                random_state: Some(seed),
                ..Default::default()
            }),
        },
    ]
}

/// Trains every configured model against one shared split and assembles the
/// comparison report.
///
/// Each model gets its own independently-fit copy of the conditional imputer
/// and column router; no fit state is shared across models. A failing model
/// is logged and excluded; siblings are unaffected.
pub struct ModelHarness {
    entries: Vec<ModelEntry>,
}

impl ModelHarness {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

    pub fn run(
        &self,
        train: &DataFrame,
        test: &DataFrame,
        plan: &FeaturePlan,
    ) -> Result<ComparisonReport> {
        let y_train_labels = target_labels(train, &plan.target)?;
        let y_test_labels = target_labels(test, &plan.target)?;

        let encoder = LabelEncoder::fit(&y_train_labels);
        let y_train = encoder.transform(&y_train_labels)?;
        let y_test = encoder.transform(&y_test_labels)?;
        let n_classes = encoder.n_classes();

        let results: Vec<(String, Result<ModelScore>)> = self
            .entries
            .par_iter()
            .map(|entry| {
                let outcome = train_one(
                    entry, train, test, plan, &y_train_labels, &y_train, &y_test, n_classes,
                    encoder.classes(),
                );
                (entry.name.clone(), outcome)
            })
            .collect();

        let mut report = ComparisonReport::default();
        for (name, outcome) in results {
            match outcome {
                Ok(score) => {
                    info!(model = %name, macro_f1 = score.macro_f1, "model evaluated");
                    report.insert(name, score);
                }
                Err(err) => {
                    warn!(model = %name, error = %err, "model training failed; excluded from comparison");
                }
            }
        }

        Ok(report)
    }
}

#[allow(clippy::too_many_arguments)]
fn train_one(
    entry: &ModelEntry,
    train: &DataFrame,
    test: &DataFrame,
    plan: &FeaturePlan,
    y_train_labels: &[String],
    y_train: &ndarray::Array1<usize>,
    y_test: &ndarray::Array1<usize>,
    n_classes: usize,
    classes: &[String],
) -> Result<ModelScore> {
    // Fresh fit state per model: the conditional imputer fits on the train
    // partition with its labels; the test partition fills from population
    // statistics so label information is never consulted outside training.
    let mut imputer =
        ClassConditionalImputer::new(plan.numeric.clone(), plan.passthrough.clone());
    imputer.fit(train, y_train_labels)?;
    let train_filled = imputer.apply(train, Some(y_train_labels))?;
    let test_filled = imputer.apply(test, None)?;

    let mut router = ColumnRouter::new(plan);
    router.fit(&train_filled)?;
    let x_train = router.to_matrix(&router.transform(&train_filled)?)?;
    let x_test = router.to_matrix(&router.transform(&test_filled)?)?;

    let sample_weight = match entry.spec.weight_policy() {
        WeightPolicy::BalancedSampleWeights => Some(balanced_sample_weights(y_train, n_classes)),
        WeightPolicy::InternalClassWeights | WeightPolicy::Unweighted => None,
    };

    let mut model = entry.spec.build(n_classes);
    model.fit(&x_train, y_train, sample_weight.as_ref())?;
    let y_pred = model.predict(&x_test)?;

    Ok(evaluate_model(y_test, &y_pred, classes))
}

fn target_labels(df: &DataFrame, target: &str) -> Result<Vec<String>> {
    df.column(target)
        .map_err(|_| GasmonError::FeatureNotFound(target.to_string()))?
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, opt)| {
            opt.map(|s| s.trim().to_string()).ok_or_else(|| {
                GasmonError::ValidationError(format!("null target label at row {row}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> FeaturePlan {
        FeaturePlan {
            numeric: vec!["x1".to_string(), "x2".to_string()],
            passthrough: vec!["flag".to_string()],
            identifier: "Session ID".to_string(),
            target: "Activity Level".to_string(),
        }
    }

    fn partitions() -> (DataFrame, DataFrame) {
        let n = 48;
        let x1: Vec<f64> = (0..n).map(|i| (i / 16) as f64 * 3.0 + (i % 4) as f64 * 0.1).collect();
        let x2: Vec<f64> = (0..n).map(|i| (i % 8) as f64 * 0.2).collect();
        let flag: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let session: Vec<String> = (0..n).map(|i| format!("s{i}")).collect();
        let label: Vec<&str> = (0..n)
            .map(|i| match i / 16 {
                0 => "Low",
                1 => "Moderate",
                _ => "High",
            })
            .collect();

        let df = df!(
            "x1" => &x1,
            "x2" => &x2,
            "flag" => &flag,
            "Session ID" => &session,
            "Activity Level" => &label,
        )
        .unwrap();

        let train_idx: Vec<u32> = (0..n as u32).filter(|i| i % 4 != 0).collect();
        let test_idx: Vec<u32> = (0..n as u32).filter(|i| i % 4 == 0).collect();
        let train = df.take(&IdxCa::from_vec("t".into(), train_idx)).unwrap();
        let test = df.take(&IdxCa::from_vec("t".into(), test_idx)).unwrap();
        (train, test)
    }

    fn quick_models() -> Vec<ModelEntry> {
        vec![
            ModelEntry {
                name: "logreg".to_string(),
                spec: ModelSpec::Linear(SoftmaxConfig {
                    max_iter: 300,
                    ..Default::default()
                }),
            },
            ModelEntry {
                name: "mlp".to_string(),
                spec: ModelSpec::Neural(MlpConfig {
                    hidden_layers: vec![8],
                    max_epochs: 50,
                    batch_size: 16,
                    ..Default::default()
                }),
            },
            ModelEntry {
                name: "gbt".to_string(),
                spec: ModelSpec::TreeEnsemble(GbtConfig {
                    n_estimators: 15,
                    max_depth: 3,
                    learning_rate: 0.2,
                    ..Default::default()
                }),
            },
        ]
    }

    #[test]
    fn test_weight_policy_per_family() {
        let models = default_models(42);
        assert_eq!(models[0].spec.weight_policy(), WeightPolicy::InternalClassWeights);
        assert_eq!(models[1].spec.weight_policy(), WeightPolicy::Unweighted);
        assert_eq!(models[2].spec.weight_policy(), WeightPolicy::BalancedSampleWeights);
    }

    #[test]
    fn test_harness_reports_all_models() {
        let (train, test) = partitions();
        let harness = ModelHarness::new(quick_models());
        let report = harness.run(&train, &test, &plan()).unwrap();

        let names: Vec<&String> = report.models().collect();
        assert_eq!(names, vec!["gbt", "logreg", "mlp"]);

        for (_, score) in report.iter() {
            assert!(score.macro_f1 >= 0.0 && score.macro_f1 <= 1.0);
            assert_eq!(score.confusion_matrix.len(), 3);
            for row in &score.confusion_matrix {
                assert_eq!(row.len(), 3);
            }
            assert_eq!(score.per_class_f1.len(), 3);
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let (train, test) = partitions();
        let harness = ModelHarness::new(quick_models());
        let a = harness.run(&train, &test, &plan()).unwrap();
        let b = harness.run(&train, &test, &plan()).unwrap();

        for ((name_a, score_a), (name_b, score_b)) in a.iter().zip(b.iter()) {
            assert_eq!(name_a, name_b);
            assert!((score_a.macro_f1 - score_b.macro_f1).abs() < 1e-12);
            assert_eq!(score_a.confusion_matrix, score_b.confusion_matrix);
        }
    }

    #[test]
    fn test_failing_model_is_isolated() {
        let (train, test) = partitions();

        let mut entries = quick_models();
        entries.push(ModelEntry {
            name: "broken_mlp".to_string(),
            spec: ModelSpec::Neural(MlpConfig {
                batch_size: 0,
                ..Default::default()
            }),
        });

        let harness = ModelHarness::new(entries);
        let report = harness.run(&train, &test, &plan()).unwrap();

        // The invalid entry is excluded; siblings still report.
        let names: Vec<&String> = report.models().collect();
        assert_eq!(names, vec!["gbt", "logreg", "mlp"]);
    }
}
