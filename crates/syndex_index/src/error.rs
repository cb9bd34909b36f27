//! Error types for the document index.

use std::io;
use syndex_resource::ResourceError;
use syndex_transform::TransformError;
use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur in document index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Fatal storage error: unopenable directory or bad transform config.
    #[error("storage error: {0}")]
    Storage(#[from] TransformError),

    /// Error from decoding or extraction, propagated from the resource layer.
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A query string could not be parsed. No partial results.
    #[error("query syntax error: {message}")]
    QuerySyntax {
        /// Description of the problem.
        message: String,
    },

    /// The persisted document set could not be read back.
    #[error("corrupt document store: {message}")]
    Corrupt {
        /// Description of the problem.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IndexError {
    /// Creates a query syntax error.
    pub fn query_syntax(message: impl Into<String>) -> Self {
        Self::QuerySyntax {
            message: message.into(),
        }
    }

    /// Creates a corrupt-store error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}
