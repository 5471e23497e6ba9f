//! Feature derivation stages
//!
//! Label canonicalization, interaction columns, z-score outlier flags, and
//! categorical encoding. Every stage is a pure function returning a new
//! frame; none mutates its input.

mod encoders;
mod interactions;
mod labels;
mod outliers;

pub use encoders::{encode_categoricals, ordinal_category, ordinal_rank, EncoderState};
pub use interactions::{add_interactions, InteractionSummary, RATIO_EPSILON};
pub use labels::normalize_labels;
pub use outliers::{add_outlier_flags, OutlierSummary};
