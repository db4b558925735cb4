//! Error types for the taxi analytics pipeline
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Batch-local and best-effort failures (one bad Parquet file, one index that
//! would not build) are captured in the stage reports rather than propagated;
//! anything that reaches the orchestrator as `Err` halts the run.

use crate::pipeline::Stage;
use thiserror::Error;

/// The main error type for the pipeline, store and query layer
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    // ============================================================================
    // Store Errors
    // ============================================================================
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Schema error in '{table}': {message}")]
    Schema { table: String, message: String },

    // ============================================================================
    // Load Errors
    // ============================================================================
    #[error("Dimension load failed for '{dimension}': {message}")]
    DimensionLoad { dimension: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Batch '{batch}' failed: {message}")]
    Batch { batch: String, message: String },

    // ============================================================================
    // Build Errors
    // ============================================================================
    #[error("Index '{name}' failed: {message}")]
    Index { name: String, message: String },

    #[error("Aggregate '{table}' failed: {message}")]
    Aggregate { table: String, message: String },

    #[error("Summary failed: {message}")]
    Summary { message: String },

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Query Errors
    // ============================================================================
    #[error("Limit must be between {min} and {max}, got '{value}'")]
    InvalidLimit { value: String, min: u32, max: u32 },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a schema error for a table
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a dimension load error
    pub fn dimension(dimension: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DimensionLoad {
            dimension: dimension.into(),
            message: message.into(),
        }
    }

    /// Create a batch error
    pub fn batch(batch: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Batch {
            batch: batch.into(),
            message: message.into(),
        }
    }

    /// Create an index error
    pub fn index(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Index {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an aggregate error
    pub fn aggregate(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Aggregate {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a summary error
    pub fn summary(message: impl Into<String>) -> Self {
        Self::Summary {
            message: message.into(),
        }
    }

    /// Wrap an error with the pipeline stage it came from
    pub fn stage(stage: Stage, source: Error) -> Self {
        Self::StageFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Stage that failed, if this error came out of the orchestrator
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Error::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Check if this error was caused by bad client input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidLimit { .. })
    }

    /// HTTP status code the query layer answers with for this error
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::batch("yellow_tripdata_2025-01.parquet", "missing columns");
        assert_eq!(
            err.to_string(),
            "Batch 'yellow_tripdata_2025-01.parquet' failed: missing columns"
        );

        let err = Error::InvalidLimit {
            value: "0".to_string(),
            min: 1,
            max: 1000,
        };
        assert_eq!(err.to_string(), "Limit must be between 1 and 1000, got '0'");
    }

    #[test]
    fn test_status_code() {
        assert_eq!(
            Error::InvalidLimit {
                value: "abc".to_string(),
                min: 1,
                max: 1000
            }
            .status_code(),
            400
        );
        assert_eq!(Error::store("connection refused").status_code(), 500);
        assert_eq!(Error::summary("boom").status_code(), 500);
    }

    #[test]
    fn test_stage_wrapping() {
        let err = Error::stage(Stage::Schema, Error::schema("fact_trip", "syntax error"));
        assert_eq!(err.failed_stage(), Some(Stage::Schema));
        assert!(err.to_string().contains("Stage 'schema' failed"));
        assert!(err.to_string().contains("fact_trip"));
        assert_eq!(Error::config("x").failed_stage(), None);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
