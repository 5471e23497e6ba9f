//! Error types for the gasmon pipeline

use thiserror::Error;

/// Result type alias for gasmon operations
pub type Result<T> = std::result::Result<T, GasmonError>;

/// Main error type for the gasmon pipeline
#[derive(Error, Debug)]
pub enum GasmonError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Schema error: missing required columns: {0:?}")]
    SchemaError(Vec<String>),

    #[error("Stratification error: {0}")]
    StratificationError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for GasmonError {
    fn from(err: polars::error::PolarsError) -> Self {
        GasmonError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for GasmonError {
    fn from(err: serde_json::Error) -> Self {
        GasmonError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GasmonError::DataError("bad frame".to_string());
        assert_eq!(err.to_string(), "Data error: bad frame");
    }

    #[test]
    fn test_schema_error_lists_columns() {
        let err = GasmonError::SchemaError(vec!["Temperature".to_string(), "Humidity".to_string()]);
        assert!(err.to_string().contains("Temperature"));
        assert!(err.to_string().contains("Humidity"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GasmonError = io_err.into();
        assert!(matches!(err, GasmonError::IoError(_)));
    }
}
