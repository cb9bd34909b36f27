//! Deflate compression transform.

use crate::error::{TransformError, TransformResult};
use crate::transform::DataTransform;
use flate2::write::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;
use std::io::Write;

/// Deflate compression at best compression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateTransform;

impl DeflateTransform {
    /// Creates a new deflate transform.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DataTransform for DeflateTransform {
    fn encode(&self, data: &[u8]) -> TransformResult<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(data)
            .map_err(|e| TransformError::compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| TransformError::compression(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> TransformResult<Vec<u8>> {
        let mut decoder = DeflateDecoder::new(Vec::new());
        decoder
            .write_all(data)
            .map_err(|e| TransformError::decompression(e.to_string()))?;
        decoder
            .finish()
            .map_err(|e| TransformError::decompression(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let transform = DeflateTransform::new();
        let data = b"the quick brown fox jumps over the lazy dog";
        let encoded = transform.encode(data).unwrap();
        assert_eq!(transform.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn compresses_repetitive_input() {
        let transform = DeflateTransform::new();
        let data = vec![b'a'; 4096];
        let encoded = transform.encode(&data).unwrap();
        assert!(encoded.len() < data.len());
    }

    #[test]
    fn empty_input_roundtrips() {
        let transform = DeflateTransform::new();
        let encoded = transform.encode(b"").unwrap();
        assert!(transform.decode(&encoded).unwrap().is_empty());
    }

    #[test]
    fn corrupt_input_fails() {
        let transform = DeflateTransform::new();
        let result = transform.decode(&[0xff, 0x00, 0xff, 0x00]);
        assert!(matches!(result, Err(TransformError::Decompression { .. })));
    }
}
