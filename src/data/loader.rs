//! SQLite table loading

use crate::error::{GasmonError, Result};
use polars::prelude::*;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::collections::HashSet;

/// Loads one table of sensor readings into a DataFrame.
///
/// Columns named in `numeric_columns` become Float64 series; everything else
/// is read as text. SQLite's loose typing means a numeric column can carry
/// stray text (the domain's `"None"` sentinel); such cells load as null.
pub struct SqliteLoader {
    db_path: String,
    table_name: String,
}

impl SqliteLoader {
    pub fn new(db_path: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            table_name: table_name.into(),
        }
    }

    /// Load the full table.
    pub fn load(&self, numeric_columns: &[String]) -> Result<DataFrame> {
        self.load_filtered(numeric_columns, None)
    }

    /// Load the table with an optional WHERE clause appended to the single
    /// SELECT. One-shot, non-streaming read.
    pub fn load_filtered(
        &self,
        numeric_columns: &[String],
        where_clause: Option<&str>,
    ) -> Result<DataFrame> {
        let conn = Connection::open(&self.db_path)?;

        let mut sql = format!("SELECT * FROM \"{}\"", self.table_name);
        if let Some(filter) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }

        let mut stmt = conn.prepare(&sql)?;
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let numeric: HashSet<&str> = numeric_columns.iter().map(|s| s.as_str()).collect();
        let is_numeric: Vec<bool> = column_names
            .iter()
            .map(|name| numeric.contains(name.as_str()))
            .collect();

        let mut float_data: Vec<Vec<Option<f64>>> = vec![Vec::new(); column_names.len()];
        let mut text_data: Vec<Vec<Option<String>>> = vec![Vec::new(); column_names.len()];

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, &as_float) in is_numeric.iter().enumerate() {
                let value = row.get_ref(idx)?;
                if as_float {
                    float_data[idx].push(Self::to_float(value));
                } else {
                    text_data[idx].push(Self::to_text(value));
                }
            }
        }

        let columns: Vec<Column> = column_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                if is_numeric[idx] {
                    Series::new(name.as_str().into(), std::mem::take(&mut float_data[idx])).into()
                } else {
                    Series::new(name.as_str().into(), std::mem::take(&mut text_data[idx])).into()
                }
            })
            .collect();

        DataFrame::new(columns).map_err(|e| GasmonError::DataError(e.to_string()))
    }

    fn to_float(value: ValueRef<'_>) -> Option<f64> {
        match value {
            ValueRef::Null => None,
            ValueRef::Integer(i) => Some(i as f64),
            ValueRef::Real(f) => Some(f),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok()),
            ValueRef::Blob(_) => None,
        }
    }

    fn to_text(value: ValueRef<'_>) -> Option<String> {
        match value {
            ValueRef::Null => None,
            ValueRef::Integer(i) => Some(i.to_string()),
            ValueRef::Real(f) => Some(f.to_string()),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().map(|s| s.to_string()),
            ValueRef::Blob(_) => None,
        }
    }
}
