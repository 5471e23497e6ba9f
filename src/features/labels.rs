//! Target label canonicalization

use crate::error::{GasmonError, Result};
use polars::prelude::*;
use std::collections::HashMap;

/// Map known spelling variants of the target label onto canonical values.
///
/// Unmapped text passes through unchanged. That leniency is deliberate: an
/// unexpected spelling becomes its own class and surfaces downstream as a
/// stratification failure instead of being dropped here.
pub fn normalize_labels(
    df: &DataFrame,
    target: &str,
    aliases: &[(String, String)],
) -> Result<DataFrame> {
    let mapping: HashMap<&str, &str> = aliases
        .iter()
        .map(|(variant, canonical)| (variant.as_str(), canonical.as_str()))
        .collect();

    let column = df
        .column(target)
        .map_err(|_| GasmonError::FeatureNotFound(target.to_string()))?;

    let normalized: StringChunked = column
        .str()?
        .into_iter()
        .map(|opt| opt.map(|value| *mapping.get(value).unwrap_or(&value)))
        .collect();

    let mut result = df.clone();
    result.with_column(normalized.with_name(target.into()).into_series())?;
    Ok(result)
}
