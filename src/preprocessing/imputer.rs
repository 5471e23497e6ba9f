//! Unconditional (per-column) imputation

use crate::error::{GasmonError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fill-value statistic learned per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Column mean
    Mean,
    /// Column median
    Median,
    /// Most frequent value; ties break to the smallest
    MostFrequent,
}

/// Per-column fill-value imputer over Float64 columns.
///
/// Fit learns one fill value per column; transform replaces null/NaN cells
/// and never refits. Columns absent at transform time are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
    fill_values: HashMap<String, f64>,
    is_fitted: bool,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit fill values on the given columns.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| GasmonError::FeatureNotFound(col_name.clone()))?;
            let floats = column.as_materialized_series().cast(&DataType::Float64)?;

            if let Some(fill) = compute_fill(&self.strategy, floats.f64()?) {
                self.fill_values.insert(col_name.clone(), fill);
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing cells in every fitted column present in the frame.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(GasmonError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, &fill) in &self.fill_values {
            let Ok(column) = df.column(col_name.as_str()) else {
                continue;
            };
            let floats = column.as_materialized_series().cast(&DataType::Float64)?;

            let filled: Float64Chunked = floats
                .f64()?
                .into_iter()
                .map(|opt| match opt {
                    Some(v) if !v.is_nan() => Some(v),
                    _ => Some(fill),
                })
                .collect();

            result.with_column(filled.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted fill value for a column, if any.
    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.fill_values.get(column).copied()
    }
}

/// Compute the fill statistic over non-missing values; None when the column
/// has no usable value to learn from.
pub(crate) fn compute_fill(strategy: &ImputeStrategy, ca: &Float64Chunked) -> Option<f64> {
    match strategy {
        ImputeStrategy::Mean => ca.mean(),
        ImputeStrategy::Median => ca.median(),
        ImputeStrategy::MostFrequent => most_frequent(ca),
    }
}

/// Most frequent non-missing value; ties break to the smallest value so the
/// result is deterministic.
pub(crate) fn most_frequent(ca: &Float64Chunked) -> Option<f64> {
    let mut values: Vec<f64> = ca
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut best_value = values[0];
    let mut best_count = 0usize;
    let mut run_value = values[0];
    let mut run_count = 0usize;

    for &v in &values {
        if v == run_value {
            run_count += 1;
        } else {
            run_value = v;
            run_count = 1;
        }
        if run_count > best_count {
            best_count = run_count;
            best_value = run_value;
        }
    }

    Some(best_value)
}
