//! Error types for the synchronization engine.

use std::time::Duration;
use thiserror::Error;

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the fetch can be retried.
        retryable: bool,
    },

    /// A fetch did not complete within the configured timeout.
    #[error("fetch timed out after {after:?}")]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// An incoming record matched more than one committed document.
    ///
    /// Never auto-resolved; the caller decides.
    #[error("record key `{key}` matches {candidates} committed documents")]
    MergeConflict {
        /// Canonical unique key of the offending record.
        key: String,
        /// Number of committed documents matching the key.
        candidates: usize,
    },

    /// Index error during reconciliation or commit.
    #[error(transparent)]
    Index(#[from] syndex_index::IndexError),

    /// Resource error while decoding or keying a record.
    #[error(transparent)]
    Resource(#[from] syndex_resource::ResourceError),

    /// I/O error while reading local payload files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if retrying the fetch may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_per_variant() {
        assert!(SyncError::transport_retryable("reset").is_retryable());
        assert!(!SyncError::transport_fatal("404").is_retryable());
        assert!(SyncError::Timeout {
            after: Duration::from_secs(5)
        }
        .is_retryable());
        assert!(!SyncError::MergeConflict {
            key: "abc".into(),
            candidates: 2
        }
        .is_retryable());
    }

    #[test]
    fn merge_conflict_names_key_and_count() {
        let err = SyncError::MergeConflict {
            key: "abc-1".into(),
            candidates: 3,
        };
        assert_eq!(
            err.to_string(),
            "record key `abc-1` matches 3 committed documents"
        );
    }
}
