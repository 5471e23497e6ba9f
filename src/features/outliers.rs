//! Z-score outlier flagging

use crate::error::Result;
use polars::prelude::*;

/// Guards the z-score denominator on zero-variance columns; the flag then
/// degenerates to "never outlier".
const STD_EPSILON: f64 = 1e-9;

/// Columns flagged and columns skipped because they were absent from the
/// frame (non-fatal; upstream schema drift).
#[derive(Debug, Clone, Default)]
pub struct OutlierSummary {
    pub flagged: Vec<String>,
    pub skipped: Vec<String>,
}

/// Derive a boolean `is_outlier_<col>` column per configured numeric column.
///
/// Mean and sample standard deviation (n−1 denominator) are computed over the
/// full column as presented. A cell is flagged when |x−μ|/(σ+ε) strictly
/// exceeds the threshold; null cells flag false.
pub fn add_outlier_flags(
    df: &DataFrame,
    columns: &[String],
    z_threshold: f64,
) -> Result<(DataFrame, OutlierSummary)> {
    let mut result = df.clone();
    let mut summary = OutlierSummary::default();

    for col_name in columns {
        let column = match df.column(col_name) {
            Ok(column) => column,
            Err(_) => {
                summary.skipped.push(col_name.clone());
                continue;
            }
        };

        let floats = column.as_materialized_series().cast(&DataType::Float64)?;
        let ca = floats.f64()?;
        let mean = ca.mean().unwrap_or(0.0);
        let std = ca.std(1).unwrap_or(0.0);

        let flags: BooleanChunked = ca
            .into_iter()
            .map(|opt| {
                Some(match opt {
                    Some(value) => (value - mean).abs() / (std + STD_EPSILON) > z_threshold,
                    None => false,
                })
            })
            .collect();

        let flag_name = format!("is_outlier_{col_name}");
        result.with_column(flags.with_name(flag_name.as_str().into()).into_series())?;
        summary.flagged.push(col_name.clone());
    }

    Ok((result, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_extreme_value_only() {
        // 24 inliers and one extreme reading; only the extreme clears z = 3.
        let mut values: Vec<f64> = (0..24).map(|i| 1.0 + (i % 4) as f64).collect();
        values.push(100.0);
        let df = df!("Temperature" => &values).unwrap();

        let (flagged, summary) =
            add_outlier_flags(&df, &["Temperature".to_string()], 3.0).unwrap();
        assert_eq!(summary.flagged, vec!["Temperature"]);

        let flags = flagged.column("is_outlier_Temperature").unwrap().bool().unwrap();
        for idx in 0..24 {
            assert_eq!(flags.get(idx), Some(false), "row {idx}");
        }
        assert_eq!(flags.get(24), Some(true));
    }

    #[test]
    fn test_single_outlier_masks_itself_in_tiny_samples() {
        // With n = 5 one extreme value inflates the sample std enough that
        // its own z-score stays under 3; nothing flags.
        let df = df!("Temperature" => &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        let (flagged, _) = add_outlier_flags(&df, &["Temperature".to_string()], 3.0).unwrap();
        let flags = flagged.column("is_outlier_Temperature").unwrap().bool().unwrap();
        for idx in 0..5 {
            assert_eq!(flags.get(idx), Some(false));
        }
    }

    #[test]
    fn test_threshold_symmetric_around_mean() {
        // Mirror-symmetric data: the two extremes sit at the same |z| and
        // must always share a verdict, flagged or not.
        let mut values: Vec<f64> = (0..20).map(|i| (i % 5) as f64 - 2.0).collect();
        values.push(-50.0);
        values.push(50.0);
        let df = df!("x" => &values).unwrap();

        for z in [1.0, 3.0, 10.0] {
            let (flagged, _) = add_outlier_flags(&df, &["x".to_string()], z).unwrap();
            let flags = flagged.column("is_outlier_x").unwrap().bool().unwrap();
            assert_eq!(flags.get(20), flags.get(21), "z = {z}");
        }

        // At z = 3 the extremes flag; at z = 10 they do not (strict ">").
        let (flagged, _) = add_outlier_flags(&df, &["x".to_string()], 3.0).unwrap();
        let flags = flagged.column("is_outlier_x").unwrap().bool().unwrap();
        assert_eq!(flags.get(21), Some(true));

        let (flagged, _) = add_outlier_flags(&df, &["x".to_string()], 10.0).unwrap();
        let flags = flagged.column("is_outlier_x").unwrap().bool().unwrap();
        assert_eq!(flags.get(21), Some(false));
    }

    #[test]
    fn test_zero_variance_never_flags() {
        let df = df!("x" => &[5.0, 5.0, 5.0, 5.0]).unwrap();
        let (flagged, _) = add_outlier_flags(&df, &["x".to_string()], 3.0).unwrap();
        let flags = flagged.column("is_outlier_x").unwrap().bool().unwrap();
        for idx in 0..4 {
            assert_eq!(flags.get(idx), Some(false));
        }
    }

    #[test]
    fn test_absent_column_skipped_silently() {
        let df = df!("x" => &[1.0, 2.0]).unwrap();
        let (flagged, summary) =
            add_outlier_flags(&df, &["x".to_string(), "ghost".to_string()], 3.0).unwrap();
        assert_eq!(summary.skipped, vec!["ghost"]);
        assert!(flagged.column("is_outlier_x").is_ok());
        assert!(flagged.column("is_outlier_ghost").is_err());
    }

    #[test]
    fn test_null_cell_flags_false() {
        let df = df!("x" => &[Some(1.0), None, Some(2.0), Some(3.0)]).unwrap();
        let (flagged, _) = add_outlier_flags(&df, &["x".to_string()], 3.0).unwrap();
        let flags = flagged.column("is_outlier_x").unwrap().bool().unwrap();
        assert_eq!(flags.get(1), Some(false));
    }
}
