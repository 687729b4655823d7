//! Error handling module for scif
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Recipe loading, settings and install steps all return these types.

use thiserror::Error;

/// Main error type for scif
#[derive(Error, Debug)]
pub enum ScifError {
    /// IO errors (directory creation, file writes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Recipe text could not be parsed
    #[error("Recipe parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// Validation errors (app names, duplicate apps)
    #[error("Validation error: {0}")]
    Validation(String),

    /// An app was requested that the recipe does not define
    #[error("Cannot find app {0} in config")]
    UnknownApp(String),

    /// A spawned command (copy, install script) failed
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for scif operations
pub type Result<T> = std::result::Result<T, ScifError>;

// Convenient error constructors
impl ScifError {
    /// Create a parse error for a 1-based line number
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            msg: msg.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a command failure error
    pub fn command_failed(msg: impl Into<String>) -> Self {
        Self::CommandFailed(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}

impl From<anyhow::Error> for ScifError {
    fn from(err: anyhow::Error) -> Self {
        Self::CommandFailed(format!("{:#}", err))
    }
}
