//! Unified error handling for the storyground crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`StoryErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Only input errors and storage failures reach callers of the pipeline.
//! Relationship lookup and generation failures are absorbed where they
//! happen: a failed lookup becomes an empty relation list and a failed
//! generation becomes a fallback answer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use storyground::error::{Error, ErrorCategory, StoryErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.category() == ErrorCategory::Input {
//!         eprintln!("Bad request: {err}");
//!     } else if err.is_recoverable() {
//!         eprintln!("Try again later: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::cache::StoreError;
pub use crate::llm::LlmError;
pub use crate::ontology::error::OntologyError;
pub use crate::relations::FetchError;
pub use crate::report::ReportError;

/// Common trait for storyground error types
pub trait StoryErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or unusable caller input
    Input,
    /// Network-related errors (HTTP, timeout)
    Network,
    /// Generation service errors
    Llm,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Network => "network",
            Self::Llm => "llm",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the storyground crate
#[derive(Error, Debug)]
pub enum Error {
    /// No session with this id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A required input (story, question, name) was empty
    #[error("No {0} provided")]
    MissingInput(&'static str),

    /// Questions were asked before the story was analysed
    #[error("Story not analyzed yet for session {0}")]
    StoryNotAnalyzed(String),

    /// Ontology extraction and processing errors
    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    /// Relationship lookup errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Generation service errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Session or cache store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Report rendering errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoryErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::SessionNotFound(_) | Self::MissingInput(_) | Self::StoryNotAnalyzed(_) => false,
            Self::Ontology(e) => e.is_recoverable(),
            Self::Fetch(_) => true,
            Self::Llm(e) => e.is_recoverable(),
            Self::Store(e) => e.is_recoverable(),
            Self::Report(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::SessionNotFound(_) | Self::MissingInput(_) | Self::StoryNotAnalyzed(_) => {
                ErrorCategory::Input
            }
            Self::Ontology(e) => match e {
                OntologyError::InvalidLimit { .. } | OntologyError::InvalidConfig { .. } => {
                    ErrorCategory::Config
                }
                OntologyError::GraphDecodeFailed { .. } => ErrorCategory::Storage,
            },
            Self::Fetch(FetchError::Cache(_)) => ErrorCategory::Storage,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Llm(LlmError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Llm(_) => ErrorCategory::Llm,
            Self::Store(_) | Self::Io(_) | Self::Json(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Report(_) | Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors() {
        let err = Error::SessionNotFound("abc".to_string());
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Session not found: abc");

        let err = Error::MissingInput("question");
        assert_eq!(err.to_string(), "No question provided");

        let err = Error::StoryNotAnalyzed("abc".to_string());
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::ServerError(503));
        assert_eq!(fetch_err.category(), ErrorCategory::Network);
        assert!(fetch_err.is_recoverable());

        let llm_err = Error::Llm(LlmError::Unavailable("down".to_string()));
        assert_eq!(llm_err.category(), ErrorCategory::Llm);

        let ontology_err = Error::Ontology(OntologyError::InvalidLimit { limit: 0 });
        assert_eq!(ontology_err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_error_conversion() {
        let store_err = StoreError::Pool("exhausted".to_string());
        let unified: Error = store_err.into();
        assert!(matches!(unified, Error::Store(_)));
        assert_eq!(unified.category(), ErrorCategory::Storage);
        assert!(unified.is_recoverable());
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("Invalid endpoint");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("Something went wrong");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(ErrorCategory::Other.as_str(), "other");
    }
}
