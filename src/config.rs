//! Pipeline configuration
//!
//! One explicit configuration value carries the column-role table, ordinal
//! vocabularies, derived-feature specs, thresholds, split fraction, and seed.
//! It is constructed once and passed down through every stage call.

use serde::{Deserialize, Serialize};

/// A closed, ordered vocabulary for an ordinal categorical column.
///
/// Categories are listed from lowest to highest rank and are expected to be
/// exhaustive, including a trailing sentinel for the domain's "None" reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinalVocabulary {
    pub column: String,
    pub categories: Vec<String>,
}

impl OrdinalVocabulary {
    pub fn new(column: impl Into<String>, categories: &[&str]) -> Self {
        Self {
            column: column.into(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Arithmetic combination of two source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionOp {
    /// left / (right + epsilon)
    Ratio,
    /// left * right
    Product,
}

/// A derived numeric column built from a pair of existing numeric columns.
/// The derivation is skipped (not an error) when either source is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionSpec {
    pub name: String,
    pub left: String,
    pub right: String,
    pub op: InteractionOp,
}

impl InteractionSpec {
    pub fn ratio(name: &str, left: &str, right: &str) -> Self {
        Self {
            name: name.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            op: InteractionOp::Ratio,
        }
    }

    pub fn product(name: &str, left: &str, right: &str) -> Self {
        Self {
            name: name.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            op: InteractionOp::Product,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// SQLite database path
    pub db_path: String,

    /// Table holding one row per sensor reading
    pub table_name: String,

    /// Target label column
    pub target_column: String,

    /// Session identifier column (traceability only, never a feature)
    pub session_column: String,

    /// Raw numeric measurement columns
    pub numeric_columns: Vec<String>,

    /// Raw categorical measurement columns (ordinal where a vocabulary
    /// exists below, one-hot otherwise)
    pub categorical_columns: Vec<String>,

    /// Columns that get a derived `is_missing_<col>` flag
    pub missing_flag_columns: Vec<String>,

    /// Numeric columns that get a derived `is_outlier_<col>` flag
    pub outlier_columns: Vec<String>,

    /// Z-score threshold for outlier flagging
    pub outlier_z_threshold: f64,

    /// Ordinal vocabularies, in declaration order
    pub ordinal_vocabularies: Vec<OrdinalVocabulary>,

    /// Derived interaction columns
    pub interactions: Vec<InteractionSpec>,

    /// Known target spelling variants mapped to canonical labels
    pub label_aliases: Vec<(String, String)>,

    /// Held-out fraction for the stratified split
    pub test_fraction: f64,

    /// Seed for every random operation in the run
    pub random_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: "data/gas_monitoring.db".to_string(),
            table_name: "gas_monitoring".to_string(),
            target_column: "Activity Level".to_string(),
            session_column: "Session ID".to_string(),
            numeric_columns: vec![
                "Temperature".to_string(),
                "Humidity".to_string(),
                "CO2_InfraredSensor".to_string(),
                "CO2_ElectroChemicalSensor".to_string(),
                "MetalOxideSensor_Unit1".to_string(),
                "MetalOxideSensor_Unit2".to_string(),
                "MetalOxideSensor_Unit3".to_string(),
                "MetalOxideSensor_Unit4".to_string(),
            ],
            categorical_columns: vec![
                "CO_GasSensor".to_string(),
                "HVAC Operation Mode".to_string(),
                "Ambient Light Level".to_string(),
                "Time of Day".to_string(),
            ],
            missing_flag_columns: vec![
                "CO2_ElectroChemicalSensor".to_string(),
                "MetalOxideSensor_Unit3".to_string(),
                "CO_GasSensor".to_string(),
                "Ambient Light Level".to_string(),
            ],
            outlier_columns: vec![
                "Temperature".to_string(),
                "Humidity".to_string(),
                "MetalOxideSensor_Unit2".to_string(),
                "CO2_InfraredSensor".to_string(),
                "MetalOxideSensor_Unit1".to_string(),
                "MetalOxideSensor_Unit4".to_string(),
            ],
            outlier_z_threshold: 3.0,
            ordinal_vocabularies: vec![
                OrdinalVocabulary::new(
                    "CO_GasSensor",
                    &["extremely low", "low", "medium", "high", "extremely high", "None"],
                ),
                OrdinalVocabulary::new(
                    "Ambient Light Level",
                    &["very_dim", "dim", "moderate", "bright", "very_bright", "None"],
                ),
                OrdinalVocabulary::new(
                    "Time of Day",
                    &["morning", "afternoon", "evening", "night"],
                ),
            ],
            interactions: vec![
                InteractionSpec::ratio("CO2_ratio", "CO2_ElectroChemicalSensor", "CO2_InfraredSensor"),
                InteractionSpec::product("MOx_1x4", "MetalOxideSensor_Unit1", "MetalOxideSensor_Unit4"),
            ],
            label_aliases: vec![
                ("Low Activity".to_string(), "Low".to_string()),
                ("LowActivity".to_string(), "Low".to_string()),
                ("Low_Activity".to_string(), "Low".to_string()),
                ("Moderate Activity".to_string(), "Moderate".to_string()),
                ("ModerateActivity".to_string(), "Moderate".to_string()),
                ("High Activity".to_string(), "High".to_string()),
            ],
            test_fraction: 0.2,
            random_seed: 42,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to override the storage location
    pub fn with_db_path(mut self, path: impl Into<String>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Builder method to override the table name
    pub fn with_table_name(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    /// Builder method to override the held-out fraction
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Builder method to override the seed
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Look up the ordinal vocabulary configured for a column, if any.
    pub fn ordinal_vocabulary(&self, column: &str) -> Option<&OrdinalVocabulary> {
        self.ordinal_vocabularies.iter().find(|v| v.column == column)
    }

    /// Columns that must be present in the raw frame before any processing.
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = vec![self.session_column.clone(), self.target_column.clone()];
        cols.extend(self.numeric_columns.iter().cloned());
        cols.extend(self.categorical_columns.iter().cloned());
        cols
    }
}
