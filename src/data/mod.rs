//! Data acquisition and row-level cleaning
//!
//! Covers the storage read, exact-duplicate removal, missingness flagging,
//! and the stratified train/test split.

mod dedupe;
mod loader;
mod missingness;
mod split;

pub use dedupe::drop_exact_duplicates;
pub use loader::SqliteLoader;
pub use missingness::add_missing_flags;
pub use split::StratifiedSplitter;

use crate::error::{GasmonError, Result};
use polars::prelude::*;

/// Verify that every required column is present before any processing.
/// All missing columns are reported at once.
pub fn assert_required_columns(df: &DataFrame, required: &[String]) -> Result<()> {
    let present: std::collections::HashSet<&str> = df
        .get_column_names()
        .iter()
        .map(|s| s.as_str())
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !present.contains(c.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(GasmonError::SchemaError(missing))
    }
}
