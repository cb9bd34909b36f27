//! Error types for the transform pipeline.

use std::io;
use thiserror::Error;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur while constructing or running transforms.
///
/// Construction errors (bad salt, missing credentials) are fatal for the
/// store being opened and are never deferred to first I/O.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The salt is not exactly [`SALT_SIZE`](crate::SALT_SIZE) bytes.
    #[error("invalid salt length: expected {expected} bytes, got {actual}")]
    InvalidSaltLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Encryption was requested without credentials.
    #[error("encryption requested without credentials")]
    MissingCredentials,

    /// The password is empty.
    #[error("empty password")]
    EmptyPassword,

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    Encryption {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed (wrong key or tampered data).
    #[error("decryption failed: {message}")]
    Decryption {
        /// Description of the failure.
        message: String,
    },

    /// Compression failed.
    #[error("compression failed: {message}")]
    Compression {
        /// Description of the failure.
        message: String,
    },

    /// Decompression failed (corrupt input).
    #[error("decompression failed: {message}")]
    Decompression {
        /// Description of the failure.
        message: String,
    },

    /// I/O error from the backing directory.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransformError {
    /// Creates an encryption error.
    pub fn encryption(message: impl Into<String>) -> Self {
        Self::Encryption {
            message: message.into(),
        }
    }

    /// Creates a decryption error.
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    /// Creates a compression error.
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression {
            message: message.into(),
        }
    }

    /// Creates a decompression error.
    pub fn decompression(message: impl Into<String>) -> Self {
        Self::Decompression {
            message: message.into(),
        }
    }
}
