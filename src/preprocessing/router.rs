//! Role-routed preprocessing composition

use super::imputer::{ImputeStrategy, SimpleImputer};
use super::scaler::{Scaler, ScalerType};
use super::FeaturePlan;
use crate::error::{GasmonError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Composes the two per-role sub-pipelines behind one fit/transform front:
/// numeric columns get median-impute + robust-scale, passthrough columns get
/// most-frequent-impute only. Unlisted columns never reach the feature
/// matrix.
///
/// Fit state comes from whichever partition `fit` sees; `transform` never
/// refits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRouter {
    numeric_columns: Vec<String>,
    passthrough_columns: Vec<String>,
    numeric_imputer: SimpleImputer,
    passthrough_imputer: SimpleImputer,
    scaler: Scaler,
    is_fitted: bool,
}

impl ColumnRouter {
    pub fn new(plan: &FeaturePlan) -> Self {
        Self::with_scaler(plan, ScalerType::Robust)
    }

    pub fn with_scaler(plan: &FeaturePlan, scaler_type: ScalerType) -> Self {
        Self {
            numeric_columns: plan.numeric.clone(),
            passthrough_columns: plan.passthrough.clone(),
            numeric_imputer: SimpleImputer::new(ImputeStrategy::Median),
            passthrough_imputer: SimpleImputer::new(ImputeStrategy::MostFrequent),
            scaler: Scaler::new(scaler_type),
            is_fitted: false,
        }
    }

    /// Fit both sub-pipelines. The scaler fits on the imputed numeric
    /// columns, so its parameters match what transform will see.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if !self.numeric_columns.is_empty() {
            self.numeric_imputer.fit(df, &self.numeric_columns)?;
            let imputed = self.numeric_imputer.transform(df)?;
            self.scaler.fit(&imputed, &self.numeric_columns)?;
        }

        if !self.passthrough_columns.is_empty() {
            self.passthrough_imputer.fit(df, &self.passthrough_columns)?;
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted sub-pipelines and project onto the feature columns,
    /// numeric first, then passthrough.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(GasmonError::ModelNotFitted);
        }

        for name in self.feature_names() {
            if df.column(&name).is_err() {
                return Err(GasmonError::FeatureNotFound(name));
            }
        }

        let mut result = self.numeric_imputer.transform(df)?;
        result = self.passthrough_imputer.transform(&result)?;
        result = self.scaler.transform(&result)?;

        let names = self.feature_names();
        Ok(result.select(names.iter().map(|s| s.as_str()))?)
    }

    /// Feature column order of the emitted matrix.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        names.extend(self.passthrough_columns.iter().cloned());
        names
    }

    /// Extract the transformed frame into a row-major matrix in
    /// `feature_names` order.
    pub fn to_matrix(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let names = self.feature_names();
        let n_rows = df.height();

        let col_data: Vec<Vec<f64>> = names
            .iter()
            .map(|col_name| {
                let column = df
                    .column(col_name)
                    .map_err(|_| GasmonError::FeatureNotFound(col_name.clone()))?;
                let floats = column.as_materialized_series().cast(&DataType::Float64)?;
                let values: Vec<f64> = floats
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                Ok(values)
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        Ok(Array2::from_shape_fn((n_rows, names.len()), |(r, c)| {
            col_refs[c][r]
        }))
    }
}
