//! Error types for the review engine.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for review operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur while configuring or running the review engine.
///
/// None of these describe findings about a reviewed API. Findings are
/// [`crate::Issue`]s; errors that surface while reviewing a batch are
/// downgraded to Critical issues at the boundary where they occur.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Check `{check}` failed internally: {message}")]
    InternalCheck { check: String, message: String },

    #[error("Failed to read test file {path}: {source}")]
    TestFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No built-in policy for commonalities version `{0}`")]
    UnknownCommonalities(String),

    #[error("Invalid pattern `{name}`: {message}")]
    InvalidPattern { name: String, message: String },

    #[error("Invalid policy configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PolicyError {
    /// Wrap a failure raised inside a single check.
    pub fn internal(check: impl Into<String>, message: impl Into<String>) -> Self {
        PolicyError::InternalCheck {
            check: check.into(),
            message: message.into(),
        }
    }
}
