//! gasmon - gas-monitoring activity classification
//!
//! Ingests tabular sensor readings from a SQLite table, cleans and
//! transforms them through a deterministic fit-then-apply feature pipeline,
//! trains three classifier families on the identical transformed data, and
//! emits a structured comparison report.
//!
//! # Modules
//!
//! - [`config`] - Explicit pipeline configuration (column roles, vocabularies, thresholds)
//! - [`data`] - Storage read, deduplication, missingness flags, stratified split
//! - [`features`] - Label normalization, interactions, outlier flags, categorical encoding
//! - [`preprocessing`] - Imputers, robust scaler, class-conditional imputer, column router
//! - [`models`] - Classifier families and the comparison harness
//! - [`eval`] - Confusion matrix, classification report, comparison artifact
//! - [`pipeline`] - The linear end-to-end driver

pub mod error;

pub mod config;
pub mod data;
pub mod eval;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod preprocessing;

pub use error::{GasmonError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{InteractionOp, InteractionSpec, OrdinalVocabulary, PipelineConfig};
    pub use crate::data::{drop_exact_duplicates, SqliteLoader, StratifiedSplitter};
    pub use crate::error::{GasmonError, Result};
    pub use crate::eval::{ComparisonReport, ModelScore};
    pub use crate::features::{encode_categoricals, normalize_labels, EncoderState};
    pub use crate::models::{
        default_models, Classifier, GradientBoostedTrees, LabelEncoder, MlpClassifier,
        ModelHarness, SoftmaxRegression,
    };
    pub use crate::preprocessing::{
        ClassConditionalImputer, ColumnRole, ColumnRouter, FeaturePlan,
    };
}
