//! Class-conditional imputation

use super::imputer::{compute_fill, ImputeStrategy};
use crate::error::{GasmonError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Imputes missing cells conditionally on the target class.
///
/// Numeric columns fill with the class median, passthrough columns with the
/// class mode. Fit additionally learns population-wide (label-independent)
/// fills as a secondary statistic: they back any class whose own fill is
/// undefined, and they are the fill source when `apply` runs without
/// labels, where label information must not be consulted.
///
/// Fit state is learned from exactly one partition; `apply` is pure and
/// never refits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConditionalImputer {
    numeric_columns: Vec<String>,
    passthrough_columns: Vec<String>,
    /// label → column → fill value; BTreeMap keeps state deterministic
    class_fills: BTreeMap<String, HashMap<String, f64>>,
    population_fills: HashMap<String, f64>,
    is_fitted: bool,
}

impl ClassConditionalImputer {
    pub fn new(numeric_columns: Vec<String>, passthrough_columns: Vec<String>) -> Self {
        Self {
            numeric_columns,
            passthrough_columns,
            class_fills: BTreeMap::new(),
            population_fills: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Learn per-class and population fills from a training partition.
    /// `labels` must carry one label per row of `df`.
    pub fn fit(&mut self, df: &DataFrame, labels: &[String]) -> Result<&mut Self> {
        if labels.len() != df.height() {
            return Err(GasmonError::ShapeError {
                expected: format!("{} labels", df.height()),
                actual: format!("{} labels", labels.len()),
            });
        }

        let mut class_rows: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row, label) in labels.iter().enumerate() {
            class_rows.entry(label.as_str()).or_default().push(row);
        }

        self.class_fills.clear();
        self.population_fills.clear();

        for (col_name, strategy) in self.scoped_columns() {
            let column = df
                .column(&col_name)
                .map_err(|_| GasmonError::FeatureNotFound(col_name.clone()))?;
            let floats = column.as_materialized_series().cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = floats.f64()?.into_iter().collect();

            for (label, rows) in &class_rows {
                let class_values: Float64Chunked = rows
                    .iter()
                    .map(|&row| values[row])
                    .collect::<Vec<Option<f64>>>()
                    .into_iter()
                    .collect();

                // A class with no non-missing value for this column gets no
                // entry; apply falls back to the population fill.
                if let Some(fill) = compute_fill(&strategy, &class_values) {
                    self.class_fills
                        .entry(label.to_string())
                        .or_default()
                        .insert(col_name.clone(), fill);
                }
            }

            let population: Float64Chunked = values.clone().into_iter().collect();
            if let Some(fill) = compute_fill(&strategy, &population) {
                self.population_fills.insert(col_name.clone(), fill);
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Fill missing cells in every scoped column present in the frame.
    ///
    /// With labels (one per row), each row fills from its class map, falling
    /// back to the population fill. Without labels, population fills apply
    /// throughout.
    pub fn apply(&self, df: &DataFrame, labels: Option<&[String]>) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(GasmonError::ModelNotFitted);
        }
        if let Some(labels) = labels {
            if labels.len() != df.height() {
                return Err(GasmonError::ShapeError {
                    expected: format!("{} labels", df.height()),
                    actual: format!("{} labels", labels.len()),
                });
            }
        }

        let mut result = df.clone();
        for (col_name, _) in self.scoped_columns() {
            let Ok(column) = df.column(col_name.as_str()) else {
                continue;
            };
            let floats = column.as_materialized_series().cast(&DataType::Float64)?;
            let population = self.population_fills.get(&col_name).copied();

            let filled: Float64Chunked = floats
                .f64()?
                .into_iter()
                .enumerate()
                .map(|(row, opt)| match opt {
                    Some(v) if !v.is_nan() => Some(v),
                    _ => self.fill_for(&col_name, labels.map(|l| l[row].as_str()), population),
                })
                .collect();

            result.with_column(filled.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }

    /// Fitted fill value for (label, column), if any.
    pub fn class_fill(&self, label: &str, column: &str) -> Option<f64> {
        self.class_fills
            .get(label)
            .and_then(|fills| fills.get(column))
            .copied()
    }

    /// Fitted population fill for a column, if any.
    pub fn population_fill(&self, column: &str) -> Option<f64> {
        self.population_fills.get(column).copied()
    }

    fn fill_for(
        &self,
        column: &str,
        label: Option<&str>,
        population: Option<f64>,
    ) -> Option<f64> {
        label
            .and_then(|l| self.class_fill(l, column))
            .or(population)
    }

    fn scoped_columns(&self) -> Vec<(String, ImputeStrategy)> {
        let mut cols: Vec<(String, ImputeStrategy)> = self
            .numeric_columns
            .iter()
            .map(|c| (c.clone(), ImputeStrategy::Median))
            .collect();
        cols.extend(
            self.passthrough_columns
                .iter()
                .map(|c| (c.clone(), ImputeStrategy::MostFrequent)),
        );
        cols
    }
}
