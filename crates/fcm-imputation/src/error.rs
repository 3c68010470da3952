//! Custom error types for fuzzy c-means imputation.
//!
//! This module provides the error hierarchy using `thiserror`. Input
//! validation failures are kept apart from engine faults so callers can tell
//! "bad input" from "engine malfunction" via [`ImputationError::is_validation_error`].
//!
//! Errors are serializable as `{ code, message }` so a request layer can hand
//! them to a client unchanged.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the imputation pipeline.
#[derive(Error, Debug)]
pub enum ImputationError {
    /// The table has no rows.
    #[error("File is empty or not readable")]
    EmptyInput,

    /// No numeric columns are present, so there is nothing to cluster.
    #[error("No numeric columns found. Fuzzy C-Means requires numeric data")]
    NoNumericColumns,

    /// Every numeric cell is missing.
    #[error("All numeric columns are completely missing. Cannot perform imputation")]
    AllNumericMissing,

    /// Cluster count is zero or not smaller than the row count.
    #[error(
        "Number of clusters (n_clusters={n_clusters}) must be at least 1 and less than number of rows ({rows})"
    )]
    InvalidClusterCount { n_clusters: usize, rows: usize },

    /// Fuzziness exponent outside the accepted range.
    #[error("Parameter m must be between 1.1 and 5 (got {0})")]
    InvalidFuzziness(f64),

    /// Input file could not be read or parsed.
    #[error("Failed to read file: {0}")]
    ReadFailure(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Internal engine error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputationError>,
    },
}

impl ImputationError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputationError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for the caller.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::NoNumericColumns => "NO_NUMERIC_COLUMNS",
            Self::AllNumericMissing => "ALL_NUMERIC_MISSING",
            Self::InvalidClusterCount { .. } => "INVALID_CLUSTER_COUNT",
            Self::InvalidFuzziness(_) => "INVALID_FUZZINESS",
            Self::ReadFailure(_) => "READ_FAILURE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the input rather than by the engine.
    ///
    /// Validation errors map to client errors; everything else is an
    /// internal failure.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Self::EmptyInput
            | Self::NoNumericColumns
            | Self::AllNumericMissing
            | Self::InvalidClusterCount { .. }
            | Self::InvalidFuzziness(_)
            | Self::ReadFailure(_)
            | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_validation_error(),
            _ => false,
        }
    }
}

impl Serialize for ImputationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ImputationError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for imputation operations.
pub type Result<T> = std::result::Result<T, ImputationError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputationError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(ImputationError::EmptyInput.error_code(), "EMPTY_INPUT");
        assert_eq!(
            ImputationError::InvalidClusterCount {
                n_clusters: 10,
                rows: 10
            }
            .error_code(),
            "INVALID_CLUSTER_COUNT"
        );
        assert_eq!(
            ImputationError::InvalidFuzziness(7.0).error_code(),
            "INVALID_FUZZINESS"
        );
    }

    #[test]
    fn test_validation_errors_are_distinguished_from_internal() {
        assert!(ImputationError::NoNumericColumns.is_validation_error());
        assert!(ImputationError::AllNumericMissing.is_validation_error());
        assert!(ImputationError::ReadFailure("bad".to_string()).is_validation_error());
        assert!(!ImputationError::Internal("boom".to_string()).is_validation_error());
        assert!(!ImputationError::ColumnNotFound("x".to_string()).is_validation_error());
    }

    #[test]
    fn test_cluster_count_message_mentions_rows() {
        let error = ImputationError::InvalidClusterCount {
            n_clusters: 5,
            rows: 5,
        };
        let message = error.to_string();
        assert!(message.contains("n_clusters=5"));
        assert!(message.contains("(5)"));
    }

    #[test]
    fn test_error_serialization() {
        let error = ImputationError::InvalidFuzziness(0.5);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("INVALID_FUZZINESS"));
        assert!(json.contains("between 1.1 and 5"));
    }

    #[test]
    fn test_with_context() {
        let error = ImputationError::EmptyInput.with_context("While validating input");
        assert!(error.to_string().contains("While validating input"));
        assert_eq!(error.error_code(), "EMPTY_INPUT"); // Preserves original code
        assert!(error.is_validation_error());
    }
}
