//! Error types for the booking quality pipeline.
//!
//! Every failure surfaces to the caller (ultimately the external scheduler).
//! Nothing in this crate retries; a failed stage leaves no readable output.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::format::FormatError;

/// Main error type for BookGuard operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration or parameter validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An expected artifact does not exist at its location
    #[error("Artifact not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Input could not be parsed into the expected record shape
    #[error("Decoding failed: {context}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Encoded output does not match the published file format
    #[error("Output format check failed: {context}")]
    Format {
        context: String,
        #[source]
        source: FormatError,
    },
}

/// Convenience type alias for Results with `PipelineError`
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given artifact path
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Wraps an I/O error, promoting `ErrorKind::NotFound` to [`PipelineError::NotFound`].
    pub fn io(path: &Path, action: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(path);
        }
        Self::Io {
            context: format!("Failed to {} {}", action, path.display()),
            source,
        }
    }

    /// Creates a decode error with context
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Creates an output format error with context
    pub fn format(context: impl Into<String>, source: FormatError) -> Self {
        Self::Format {
            context: context.into(),
            source,
        }
    }

    /// Returns true when the error means an input artifact was absent.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ConfigValidationError> for PipelineError {
    fn from(error: ConfigValidationError) -> Self {
        Self::configuration(error.to_string())
    }
}
