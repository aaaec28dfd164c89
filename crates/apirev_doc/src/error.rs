//! Error types for document loading.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for document operations.
pub type DocResult<T> = Result<T, DocError>;

/// Errors raised while turning a file into a document tree.
///
/// All variants are load errors: the input could not be read or is not a
/// well-formed description. They never describe findings about content.
#[derive(Error, Debug)]
pub enum DocError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported mapping key in {path} at {location}")]
    InvalidKey { path: PathBuf, location: String },

    #[error("Duplicate mapping key `{key}` in {path} at {location}")]
    DuplicateKey {
        path: PathBuf,
        key: String,
        location: String,
    },
}

impl DocError {
    /// Path of the file that failed to load.
    pub fn path(&self) -> &Path {
        match self {
            DocError::Read { path, .. }
            | DocError::Parse { path, .. }
            | DocError::InvalidKey { path, .. }
            | DocError::DuplicateKey { path, .. } => path,
        }
    }

    /// Whether the failure is a syntax problem in the file itself
    /// rather than an unreadable file.
    pub fn is_syntax(&self) -> bool {
        !matches!(self, DocError::Read { .. })
    }
}
