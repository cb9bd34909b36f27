//! Error types for resource handling.

use std::io;
use thiserror::Error;

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors that can occur while building and using resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A configuration entry is invalid. Rejects that entry only.
    #[error("invalid configuration entry `{name}`: {message}")]
    Configuration {
        /// Name of the offending entry, or `<unnamed>`.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// A field extraction expression is malformed. Isolates that field only.
    #[error("invalid extraction expression for field `{field}`: {message}")]
    Extraction {
        /// The field whose expression failed.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// A payload could not be decoded. Aborts that payload only.
    #[error("unable to decode payload: {message}")]
    Decode {
        /// Description of the problem.
        message: String,
    },

    /// A record carries no value for a field declared unique.
    #[error("record has no value for unique field `{field}`")]
    MissingUniqueValue {
        /// The unique field without a value.
        field: String,
    },

    /// An argument failed validation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ResourceError {
    /// Creates a configuration error scoped to one entry.
    pub fn configuration(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an extraction error scoped to one field.
    pub fn extraction(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
