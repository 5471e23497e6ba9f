//! End-to-end pipeline driver
//!
//! Strictly linear control flow: load → schema check → dedupe → label
//! normalization → missingness flags → interactions → outlier flags →
//! categorical encoding → role selection → stratified split → model harness
//! → comparison report.

use crate::config::PipelineConfig;
use crate::data::{add_missing_flags, assert_required_columns, drop_exact_duplicates, SqliteLoader, StratifiedSplitter};
use crate::error::Result;
use crate::eval::ComparisonReport;
use crate::features::{add_interactions, add_outlier_flags, encode_categoricals, normalize_labels};
use crate::models::{default_models, ModelHarness};
use crate::preprocessing::FeaturePlan;
use polars::prelude::*;
use tracing::{debug, info};

/// Load the configured table and run the full pipeline.
pub fn run(config: &PipelineConfig) -> Result<ComparisonReport> {
    let loader = SqliteLoader::new(&config.db_path, &config.table_name);
    let df = loader.load(&config.numeric_columns)?;
    info!(rows = df.height(), cols = df.width(), "loaded table");

    run_frame(config, df)
}

/// Run every stage on an already-loaded frame.
pub fn run_frame(config: &PipelineConfig, df: DataFrame) -> Result<ComparisonReport> {
    assert_required_columns(&df, &config.required_columns())?;

    let (df, removed) = drop_exact_duplicates(&df)?;
    info!(removed, rows = df.height(), "dropped exact duplicates");

    let df = normalize_labels(&df, &config.target_column, &config.label_aliases)?;

    let df = add_missing_flags(&df, &config.missing_flag_columns)?;

    let (df, interactions) = add_interactions(&df, &config.interactions)?;
    if !interactions.skipped.is_empty() {
        debug!(skipped = ?interactions.skipped, "interaction specs skipped");
    }

    let (df, outliers) =
        add_outlier_flags(&df, &config.outlier_columns, config.outlier_z_threshold)?;
    if !outliers.skipped.is_empty() {
        debug!(skipped = ?outliers.skipped, "outlier columns skipped");
    }

    let (df, encoder_state) =
        encode_categoricals(&df, &config.categorical_columns, config)?;

    let plan = FeaturePlan::from_frame(config, &df, &encoder_state);
    let df = plan.select(&df)?;
    info!(
        numeric = plan.numeric.len(),
        passthrough = plan.passthrough.len(),
        "feature plan assembled"
    );

    let splitter = StratifiedSplitter::new(config.test_fraction, config.random_seed);
    let (train, test) = splitter.split(&df, &config.target_column)?;
    info!(train = train.height(), test = test.height(), "stratified split");

    let harness = ModelHarness::new(default_models(config.random_seed));
    let report = harness.run(&train, &test, &plan)?;
    info!(models = report.iter().count(), "model comparison complete");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_column_is_fatal_before_processing() {
        let config = PipelineConfig::default();
        let df = df!("Temperature" => &[1.0, 2.0]).unwrap();
        let err = run_frame(&config, df).unwrap_err();
        assert!(matches!(err, crate::error::GasmonError::SchemaError(_)));
    }
}
