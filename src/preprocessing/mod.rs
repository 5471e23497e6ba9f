//! Stateful preprocessing
//!
//! The fit-then-apply stages whose learned parameters must transfer
//! bit-for-bit between partitions: simple imputation, robust scaling, the
//! class-conditional imputer, and the role-routing composition in front of
//! every model.

mod conditional;
mod imputer;
mod router;
mod scaler;

pub use conditional::ClassConditionalImputer;
pub use imputer::{ImputeStrategy, SimpleImputer};
pub use router::ColumnRouter;
pub use scaler::{Scaler, ScalerType};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::EncoderState;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a column in the feature pipeline, assigned per column name from
/// static configuration, never inferred from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Numeric,
    OrdinalCategorical,
    NominalCategorical,
    DerivedFlag,
    Passthrough,
    Target,
    Identifier,
}

/// The routing table for the encoded frame: which columns are scaled, which
/// pass through unscaled, and which are carried without entering the
/// feature matrix at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePlan {
    /// Columns routed to impute-and-scale
    pub numeric: Vec<String>,
    /// Columns routed to impute-only (flags, ordinal ranks, one-hot dummies)
    pub passthrough: Vec<String>,
    /// Session identifier, carried for traceability, never a feature
    pub identifier: String,
    /// Target label column
    pub target: String,
}

impl FeaturePlan {
    /// Build the plan from the encoded frame and the stage states.
    pub fn from_frame(
        config: &PipelineConfig,
        df: &DataFrame,
        encoder_state: &EncoderState,
    ) -> Self {
        let present = |name: &String| df.column(name).is_ok();

        let mut numeric: Vec<String> = config
            .numeric_columns
            .iter()
            .filter(|c| present(c))
            .cloned()
            .collect();
        numeric.extend(
            config
                .interactions
                .iter()
                .map(|spec| spec.name.clone())
                .filter(|c| present(c)),
        );

        let mut passthrough: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| name.starts_with("is_missing_") || name.starts_with("is_outlier_"))
            .collect();
        passthrough.extend(encoder_state.one_hot_columns.iter().cloned());
        passthrough.extend(
            encoder_state
                .ordinal_columns
                .iter()
                .filter(|c| present(c))
                .cloned(),
        );

        Self {
            numeric,
            passthrough,
            identifier: config.session_column.clone(),
            target: config.target_column.clone(),
        }
    }

    /// Role assigned to a column name under this plan.
    pub fn role(&self, name: &str) -> Option<ColumnRole> {
        if name == self.target {
            Some(ColumnRole::Target)
        } else if name == self.identifier {
            Some(ColumnRole::Identifier)
        } else if self.numeric.iter().any(|c| c == name) {
            Some(ColumnRole::Numeric)
        } else if name.starts_with("is_missing_") || name.starts_with("is_outlier_") {
            Some(ColumnRole::DerivedFlag)
        } else if self.passthrough.iter().any(|c| c == name) {
            Some(ColumnRole::Passthrough)
        } else {
            None
        }
    }

    /// All feature columns in matrix order: numeric first, then passthrough.
    pub fn feature_columns(&self) -> Vec<String> {
        let mut cols = self.numeric.clone();
        cols.extend(self.passthrough.iter().cloned());
        cols
    }

    /// Project the frame onto the plan: feature columns coerced to Float64,
    /// identifier and target carried as-is, everything else dropped.
    pub fn select(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::new();
        for name in self.feature_columns() {
            let series = df
                .column(&name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            columns.push(series.into());
        }
        columns.push(df.column(&self.identifier)?.clone());
        columns.push(df.column(&self.target)?.clone());
        Ok(DataFrame::new(columns)?)
    }
}
