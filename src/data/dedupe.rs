//! Exact-duplicate removal

use crate::error::Result;
use polars::prelude::*;
use std::collections::HashSet;

/// Drop rows identical across every column, keeping the first occurrence.
/// Returns the deduplicated frame and the number of rows removed; the count
/// is observability only and drives no control flow.
pub fn drop_exact_duplicates(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let n_rows = df.height();

    // Materialize one key string per row from every column's value.
    let mut keys: Vec<String> = vec![String::new(); n_rows];
    for column in df.get_columns() {
        // `Series::iter` requires a single chunk; frames produced by vstack
        // are multi-chunk, so rechunk first (values are unchanged).
        let series = column.as_materialized_series().rechunk();
        for (row_idx, value) in series.iter().enumerate() {
            let key = &mut keys[row_idx];
            key.push('\u{1}');
            key.push_str(&format!("{value:?}"));
        }
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(n_rows);
    let mut keep: Vec<IdxSize> = Vec::with_capacity(n_rows);
    for (row_idx, key) in keys.iter().enumerate() {
        if seen.insert(key.as_str()) {
            keep.push(row_idx as IdxSize);
        }
    }

    let removed = n_rows - keep.len();
    if removed == 0 {
        return Ok((df.clone(), 0));
    }

    let indices = IdxCa::from_vec("keep".into(), keep);
    let deduped = df.take(&indices)?;
    Ok((deduped, removed))
}
