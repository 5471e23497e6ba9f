//! Missingness indicator columns

use crate::error::{GasmonError, Result};
use polars::prelude::*;

/// Sentinel text some sensors report instead of a proper null.
const MISSING_SENTINEL: &str = "none";

/// Derive a boolean `is_missing_<col>` column for each configured column.
///
/// A cell counts as missing when it is null (or NaN for floats) or when its
/// trimmed, case-folded text equals the `"none"` sentinel. Source columns are
/// left untouched.
pub fn add_missing_flags(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let mut result = df.clone();

    for col_name in columns {
        let column = result
            .column(col_name)
            .map_err(|_| GasmonError::FeatureNotFound(col_name.clone()))?;
        let series = column.as_materialized_series();

        let flags: BooleanChunked = match series.dtype() {
            DataType::String => series
                .str()?
                .into_iter()
                .map(|opt| {
                    Some(match opt {
                        None => true,
                        Some(text) => text.trim().eq_ignore_ascii_case(MISSING_SENTINEL),
                    })
                })
                .collect(),
            _ => {
                let floats = series.cast(&DataType::Float64)?;
                floats
                    .f64()?
                    .into_iter()
                    .map(|opt| Some(opt.map_or(true, |v| v.is_nan())))
                    .collect()
            }
        };

        let flag_name = format!("is_missing_{col_name}");
        result.with_column(flags.with_name(flag_name.as_str().into()).into_series())?;
    }

    Ok(result)
}
