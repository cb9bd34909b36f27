//! Transform trait definition.

use crate::error::TransformResult;

/// A symmetric, stateless byte-stream transform.
///
/// # Invariants
///
/// - `decode(encode(data)) == data` for all inputs
/// - Transforms hold no state between calls
/// - Transforms must be `Send + Sync` for concurrent readers
///
/// # Implementors
///
/// - [`crate::DeflateTransform`] - deflate compression
/// - [`crate::CipherTransform`] - AES-256-GCM encryption
pub trait DataTransform: Send + Sync {
    /// Applies the forward (write-side) transform.
    fn encode(&self, data: &[u8]) -> TransformResult<Vec<u8>>;

    /// Applies the inverse (read-side) transform.
    ///
    /// # Errors
    ///
    /// Returns an error when the input was not produced by
    /// [`encode`](Self::encode), was tampered with, or was encoded under a
    /// different key.
    fn decode(&self, data: &[u8]) -> TransformResult<Vec<u8>>;
}
