//! Custom error types for ontology operations
//!
//! Graph lookups never fail: a concept that is not in the graph is reported
//! as `None` or an empty list. These variants cover the cases where the
//! caller handed the ontology layer something it cannot work with.

use thiserror::Error;

/// Result type alias for ontology operations
pub type OntologyResult<T> = Result<T, OntologyError>;

/// Custom error type for ontology operations
#[derive(Debug, Error)]
pub enum OntologyError {
    /// A concept limit of zero was requested
    #[error("Invalid concept limit: {limit}")]
    InvalidLimit { limit: usize },

    /// Graph JSON could not be decoded
    #[error("Failed to decode concept graph: {reason}")]
    GraphDecodeFailed { reason: String },

    /// Invalid configuration value
    #[error("Invalid config for {field}='{value}': {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },
}

impl OntologyError {
    /// Create an invalid config error
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
