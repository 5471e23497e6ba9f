//! Interaction feature generation

use crate::config::{InteractionOp, InteractionSpec};
use crate::error::Result;
use polars::prelude::*;

/// Guards the ratio denominator against division by zero.
pub const RATIO_EPSILON: f64 = 1e-6;

/// Which derived columns were actually produced, and which specs were
/// skipped because a source column was absent. Skips are policy, not errors.
#[derive(Debug, Clone, Default)]
pub struct InteractionSummary {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
}

/// Derive the configured interaction columns. A spec is applied only when
/// both source columns are present; null operands propagate null.
pub fn add_interactions(
    df: &DataFrame,
    specs: &[InteractionSpec],
) -> Result<(DataFrame, InteractionSummary)> {
    let mut result = df.clone();
    let mut summary = InteractionSummary::default();

    for spec in specs {
        let (left, right) = match (df.column(&spec.left), df.column(&spec.right)) {
            (Ok(left), Ok(right)) => (left, right),
            _ => {
                summary.skipped.push(spec.name.clone());
                continue;
            }
        };

        let left = left.as_materialized_series().cast(&DataType::Float64)?;
        let right = right.as_materialized_series().cast(&DataType::Float64)?;

        let derived: Float64Chunked = left
            .f64()?
            .into_iter()
            .zip(right.f64()?.into_iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(apply(spec.op, a, b)),
                _ => None,
            })
            .collect();

        result.with_column(derived.with_name(spec.name.as_str().into()).into_series())?;
        summary.added.push(spec.name.clone());
    }

    Ok((result, summary))
}

fn apply(op: InteractionOp, a: f64, b: f64) -> f64 {
    match op {
        InteractionOp::Ratio => a / (b + RATIO_EPSILON),
        InteractionOp::Product => a * b,
    }
}
