//! Error types for flamlog.
//!
//! This module defines all error types used throughout the flamlog crate,
//! separating client mistakes (missing or unencodable form fields) from
//! server-side failures (loading, writing, rendering).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flamlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// The backing file could not be read or parsed.
    #[error("failed to load records from {path}: {message}")]
    Load {
        /// Path to the backing file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// Persisting the table to the backing file failed.
    #[error("failed to write records to {path}: {source}")]
    Write {
        /// Path to the backing file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Request Errors ===
    /// A required form field was not submitted.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// A field holds characters the backing file's encoding cannot store.
    #[error("field '{field}' contains characters outside ISO-8859-1")]
    Unencodable {
        /// Name of the offending field.
        field: String,
    },

    /// The request body could not be read as a form.
    #[error("invalid form submission: {message}")]
    InvalidForm {
        /// Description of the problem.
        message: String,
    },

    /// A page could not be rendered.
    #[error("render error: {0}")]
    Render(String),

    /// A store operation moved off the async workers panicked or was
    /// cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for flamlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a load error for the given path.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an unencodable field error.
    #[must_use]
    pub fn unencodable(field: impl Into<String>) -> Self {
        Self::Unencodable {
            field: field.into(),
        }
    }

    /// Create an invalid form error.
    #[must_use]
    pub fn invalid_form(message: impl Into<String>) -> Self {
        Self::InvalidForm {
            message: message.into(),
        }
    }

    /// Create a render error.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Check if this error was caused by the submitted request rather than
    /// by the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::Unencodable { .. } | Self::InvalidForm { .. }
        )
    }
}
