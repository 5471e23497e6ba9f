//! Stratified train/test split

use crate::error::{GasmonError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Stratified holdout splitter over the normalized target label.
///
/// Every class must be representable in both partitions; an undersized class
/// fails the whole run rather than producing a degraded split.
pub struct StratifiedSplitter {
    test_fraction: f64,
    seed: u64,
}

impl StratifiedSplitter {
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        Self {
            test_fraction,
            seed,
        }
    }

    /// Partition the frame into (train, test) stratified by `target`.
    pub fn split(&self, df: &DataFrame, target: &str) -> Result<(DataFrame, DataFrame)> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(GasmonError::ValidationError(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }

        let labels = df
            .column(target)
            .map_err(|_| GasmonError::FeatureNotFound(target.to_string()))?
            .str()?;

        // Group row indices per class; BTreeMap keeps class iteration stable.
        let mut class_indices: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, opt) in labels.into_iter().enumerate() {
            let label = opt.ok_or_else(|| {
                GasmonError::ValidationError(format!("null target label at row {idx}"))
            })?;
            class_indices
                .entry(label.trim().to_string())
                .or_default()
                .push(idx);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train_idx: Vec<IdxSize> = Vec::new();
        let mut test_idx: Vec<IdxSize> = Vec::new();

        for (label, mut indices) in class_indices {
            let n = indices.len();
            if n < 2 {
                return Err(GasmonError::StratificationError(format!(
                    "class \"{label}\" has {n} member(s); need at least 2 to populate both partitions"
                )));
            }

            indices.shuffle(&mut rng);

            let mut n_test = ((n as f64) * self.test_fraction).round() as usize;
            n_test = n_test.clamp(1, n - 1);

            for &idx in indices.iter().take(n_test) {
                test_idx.push(idx as IdxSize);
            }
            for &idx in indices.iter().skip(n_test) {
                train_idx.push(idx as IdxSize);
            }
        }

        // Restore original row order inside each partition.
        train_idx.sort_unstable();
        test_idx.sort_unstable();

        let train = df.take(&IdxCa::from_vec("train".into(), train_idx))?;
        let test = df.take(&IdxCa::from_vec("test".into(), test_idx))?;
        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled_frame(labels: &[&str]) -> DataFrame {
        let values: Vec<f64> = (0..labels.len()).map(|i| i as f64).collect();
        df!(
            "x" => &values,
            "Activity Level" => labels,
        )
        .unwrap()
    }

    #[test]
    fn test_split_proportions() {
        let labels: Vec<&str> = std::iter::repeat("Low")
            .take(10)
            .chain(std::iter::repeat("High").take(10))
            .collect();
        let df = labeled_frame(&labels);

        let splitter = StratifiedSplitter::new(0.2, 42);
        let (train, test) = splitter.split(&df, "Activity Level").unwrap();

        assert_eq!(train.height(), 16);
        assert_eq!(test.height(), 4);
    }

    #[test]
    fn test_every_class_in_both_partitions() {
        let labels: Vec<&str> = std::iter::repeat("Low")
            .take(8)
            .chain(std::iter::repeat("Moderate").take(6))
            .chain(std::iter::repeat("High").take(4))
            .collect();
        let df = labeled_frame(&labels);

        let splitter = StratifiedSplitter::new(0.25, 42);
        let (train, test) = splitter.split(&df, "Activity Level").unwrap();

        for partition in [&train, &test] {
            let col = partition.column("Activity Level").unwrap().str().unwrap();
            let mut seen: Vec<&str> = col.into_iter().flatten().collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen, vec!["High", "Low", "Moderate"]);
        }
    }

    #[test]
    fn test_undersized_class_fails() {
        let df = labeled_frame(&["Low", "Low", "Low", "High"]);
        let splitter = StratifiedSplitter::new(0.2, 42);
        let err = splitter.split(&df, "Activity Level").unwrap_err();
        assert!(matches!(err, GasmonError::StratificationError(_)));
    }

    #[test]
    fn test_deterministic_given_seed() {
        let labels: Vec<&str> = (0..30)
            .map(|i| if i % 3 == 0 { "Low" } else { "High" })
            .collect();
        let df = labeled_frame(&labels);

        let splitter = StratifiedSplitter::new(0.2, 7);
        let (train_a, _) = splitter.split(&df, "Activity Level").unwrap();
        let (train_b, _) = splitter.split(&df, "Activity Level").unwrap();

        let a: Vec<Option<f64>> = train_a.column("x").unwrap().f64().unwrap().into_iter().collect();
        let b: Vec<Option<f64>> = train_b.column("x").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_partitions_are_disjoint_and_exhaustive() {
        let labels: Vec<&str> = std::iter::repeat("Low")
            .take(12)
            .chain(std::iter::repeat("High").take(9))
            .collect();
        let df = labeled_frame(&labels);

        let splitter = StratifiedSplitter::new(0.3, 42);
        let (train, test) = splitter.split(&df, "Activity Level").unwrap();

        let mut ids: Vec<i64> = train
            .column("x")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .chain(test.column("x").unwrap().f64().unwrap().into_iter())
            .map(|v| v.unwrap() as i64)
            .collect();
        ids.sort_unstable();
        let expected: Vec<i64> = (0..21).collect();
        assert_eq!(ids, expected);
    }
}
