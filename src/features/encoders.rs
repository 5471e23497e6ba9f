//! Categorical encoding
//!
//! Two regimes, deliberately asymmetric: ordinal columns use a closed,
//! pre-declared vocabulary; nominal columns one-hot expand over an open
//! vocabulary derived from the data being encoded and captured into the
//! encoder state.

use crate::config::{OrdinalVocabulary, PipelineConfig};
use crate::error::{GasmonError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// State captured while encoding: which columns went ordinal, which one-hot,
/// and the category vocabulary observed per nominal column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderState {
    pub ordinal_columns: Vec<String>,
    pub one_hot_columns: Vec<String>,
    pub observed_vocabularies: Vec<(String, Vec<String>)>,
}

/// Encode every configured categorical column.
///
/// Columns with a configured vocabulary are ordinal-encoded in place (text →
/// 0-based rank as Float64; out-of-vocabulary text → null, flowing into the
/// imputation stages). The rest are one-hot expanded and the source column
/// dropped.
pub fn encode_categoricals(
    df: &DataFrame,
    categorical_columns: &[String],
    config: &PipelineConfig,
) -> Result<(DataFrame, EncoderState)> {
    let mut result = df.clone();
    let mut state = EncoderState::default();

    for col_name in categorical_columns {
        if result.column(col_name).is_err() {
            return Err(GasmonError::FeatureNotFound(col_name.clone()));
        }

        match config.ordinal_vocabulary(col_name) {
            Some(vocab) => {
                result = ordinal_encode(&result, vocab)?;
                state.ordinal_columns.push(col_name.clone());
            }
            None => {
                let (expanded, generated, observed) = one_hot_encode(&result, col_name)?;
                result = expanded;
                state.one_hot_columns.extend(generated);
                state
                    .observed_vocabularies
                    .push((col_name.clone(), observed));
            }
        }
    }

    Ok((result, state))
}

/// Rank of a normalized value within a vocabulary, matching after trim and
/// case-fold on both sides.
pub fn ordinal_rank(vocab: &OrdinalVocabulary, value: &str) -> Option<usize> {
    let normalized = value.trim().to_lowercase();
    vocab
        .categories
        .iter()
        .position(|category| category.trim().to_lowercase() == normalized)
}

/// Normalized category text for a rank; the inverse of [`ordinal_rank`]
/// restricted to the vocabulary.
pub fn ordinal_category(vocab: &OrdinalVocabulary, rank: usize) -> Option<String> {
    vocab
        .categories
        .get(rank)
        .map(|category| category.trim().to_lowercase())
}

fn ordinal_encode(df: &DataFrame, vocab: &OrdinalVocabulary) -> Result<DataFrame> {
    let column = df.column(&vocab.column)?;

    let ranks: Float64Chunked = column
        .str()?
        .into_iter()
        .map(|opt| opt.and_then(|value| ordinal_rank(vocab, value).map(|rank| rank as f64)))
        .collect();

    let mut result = df.clone();
    result.with_column(
        ranks
            .with_name(vocab.column.as_str().into())
            .into_series(),
    )?;
    Ok(result)
}

fn one_hot_encode(
    df: &DataFrame,
    col_name: &str,
) -> Result<(DataFrame, Vec<String>, Vec<String>)> {
    let column = df.column(col_name)?;
    let values: Vec<Option<&str>> = column.str()?.into_iter().collect();

    // Open vocabulary: every category observed in the data being encoded,
    // sorted for a deterministic column order.
    let observed: Vec<String> = values
        .iter()
        .flatten()
        .map(|v| v.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut result = df.clone();
    let mut generated = Vec::with_capacity(observed.len());

    for category in &observed {
        let flags: BooleanChunked = values
            .iter()
            .map(|opt| Some(opt.map_or(false, |v| v == category.as_str())))
            .collect();
        let dummy_name = format!("{col_name}_{category}");
        result.with_column(flags.with_name(dummy_name.as_str().into()).into_series())?;
        generated.push(dummy_name);
    }

    let result = result.drop(col_name)?;
    Ok((result, generated, observed))
}
