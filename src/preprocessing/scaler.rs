//! Feature scaling

use crate::error::{GasmonError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of scaler to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Robust scaling using median and IQR. The default here: the sensor
    /// columns carry heavy-tailed outliers that would distort a
    /// variance-based scale.
    Robust,
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
}

/// Parameters for a fitted scaler.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // median or mean
    scale: f64,  // IQR or std
}

/// Feature scaler with per-column fitted parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit center/scale parameters per column.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| GasmonError::FeatureNotFound(col_name.clone()))?;
            let floats = column.as_materialized_series().cast(&DataType::Float64)?;

            let params = self.compute_params(floats.f64()?);
            self.params.insert(col_name.clone(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale every fitted column present in the frame.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(GasmonError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, params) in &self.params {
            let Ok(column) = df.column(col_name.as_str()) else {
                continue;
            };
            let floats = column.as_materialized_series().cast(&DataType::Float64)?;

            let scaled: Float64Chunked = floats
                .f64()?
                .into_iter()
                .map(|opt| opt.map(|v| (v - params.center) / params.scale))
                .collect();

            result.with_column(scaled.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_params(&self, ca: &Float64Chunked) -> ScalerParams {
        match self.scaler_type {
            ScalerType::Robust => {
                let median = ca.median().unwrap_or(0.0);
                let q1 = ca
                    .quantile(0.25, QuantileMethod::Linear)
                    .unwrap_or(Some(0.0))
                    .unwrap_or(0.0);
                let q3 = ca
                    .quantile(0.75, QuantileMethod::Linear)
                    .unwrap_or(Some(1.0))
                    .unwrap_or(1.0);
                let iqr = q3 - q1;
                ScalerParams {
                    center: median,
                    scale: if iqr == 0.0 { 1.0 } else { iqr },
                }
            }
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(1).unwrap_or(1.0);
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
        }
    }
}
