//! Pipeline assembly from configuration options.

use crate::compress::DeflateTransform;
use crate::encrypt::{CipherTransform, Credentials};
use crate::error::{TransformError, TransformResult};
use crate::transform::DataTransform;

/// Options selecting which transforms wrap the store.
///
/// Both flags default to off, which yields a pass-through pipeline.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Whether to compress stored bytes.
    pub use_compression: bool,
    /// Whether to encrypt stored bytes.
    pub use_encryption: bool,
    /// Credentials for encryption. Required when `use_encryption` is set;
    /// provisioning them is an external credential concern.
    pub credentials: Option<Credentials>,
}

impl TransformOptions {
    /// Creates options with both transforms off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables compression.
    #[must_use]
    pub fn with_compression(mut self) -> Self {
        self.use_compression = true;
        self
    }

    /// Enables encryption with the given credentials.
    #[must_use]
    pub fn with_encryption(mut self, credentials: Credentials) -> Self {
        self.use_encryption = true;
        self.credentials = Some(credentials);
        self
    }
}

/// An ordered stack of [`DataTransform`]s.
///
/// `encode` applies transforms in stack order (compress, then encrypt);
/// `decode` applies the exact inverse order (decrypt, then decompress).
/// The order is a correctness invariant, not a preference: decrypting
/// before decompressing is the only sequence that undoes the write path.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn DataTransform>>,
}

impl TransformPipeline {
    /// A pass-through pipeline with no transforms.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Builds the pipeline described by the options.
    ///
    /// # Errors
    ///
    /// Fails when encryption is requested without credentials, or when the
    /// cipher cannot be constructed. Failures here are fatal for the store
    /// being opened.
    pub fn from_options(options: &TransformOptions) -> TransformResult<Self> {
        let mut transforms: Vec<Box<dyn DataTransform>> = Vec::new();
        if options.use_compression {
            transforms.push(Box::new(DeflateTransform::new()));
        }
        if options.use_encryption {
            let credentials = options
                .credentials
                .as_ref()
                .ok_or(TransformError::MissingCredentials)?;
            transforms.push(Box::new(CipherTransform::new(credentials)?));
        }
        Ok(Self { transforms })
    }

    /// Returns the number of layered transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true if the pipeline is pass-through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Applies the write-side transforms in order.
    pub fn encode(&self, data: &[u8]) -> TransformResult<Vec<u8>> {
        let mut current = data.to_vec();
        for transform in &self.transforms {
            current = transform.encode(&current)?;
        }
        Ok(current)
    }

    /// Applies the read-side transforms in inverse order.
    pub fn decode(&self, data: &[u8]) -> TransformResult<Vec<u8>> {
        let mut current = data.to_vec();
        for transform in self.transforms.iter().rev() {
            current = transform.decode(&current)?;
        }
        Ok(current)
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encrypt::SALT_SIZE;
    use proptest::prelude::*;

    fn credentials() -> Credentials {
        Credentials::new("pipeline password", &[0x11; SALT_SIZE]).unwrap()
    }

    fn all_shapes() -> Vec<(&'static str, TransformPipeline)> {
        vec![
            (
                "plain",
                TransformPipeline::from_options(&TransformOptions::new()).unwrap(),
            ),
            (
                "compression",
                TransformPipeline::from_options(&TransformOptions::new().with_compression())
                    .unwrap(),
            ),
            (
                "encryption",
                TransformPipeline::from_options(
                    &TransformOptions::new().with_encryption(credentials()),
                )
                .unwrap(),
            ),
            (
                "both",
                TransformPipeline::from_options(
                    &TransformOptions::new()
                        .with_compression()
                        .with_encryption(credentials()),
                )
                .unwrap(),
            ),
        ]
    }

    #[test]
    fn default_options_are_pass_through() {
        let pipeline = TransformPipeline::from_options(&TransformOptions::default()).unwrap();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.encode(b"data").unwrap(), b"data");
    }

    #[test]
    fn all_four_shapes_roundtrip() {
        let data = b"{\"uuid\": \"abc-1\", \"givenName\": \"Tom\"}";
        for (shape, pipeline) in all_shapes() {
            let encoded = pipeline.encode(data).unwrap();
            let decoded = pipeline.decode(&encoded).unwrap();
            assert_eq!(decoded, data, "shape `{shape}` failed to round-trip");
        }
    }

    #[test]
    fn both_shape_layers_in_order() {
        let pipeline = TransformPipeline::from_options(
            &TransformOptions::new()
                .with_compression()
                .with_encryption(credentials()),
        )
        .unwrap();
        assert_eq!(pipeline.len(), 2);

        // The outermost layer must be the cipher: decoding with the cipher
        // alone yields valid deflate bytes.
        let data = vec![b'x'; 1024];
        let encoded = pipeline.encode(&data).unwrap();
        let cipher = CipherTransform::new(&credentials()).unwrap();
        use crate::transform::DataTransform;
        let inner = cipher.decode(&encoded).unwrap();
        let inflated = DeflateTransform::new().decode(&inner).unwrap();
        assert_eq!(inflated, data);
    }

    #[test]
    fn encryption_without_credentials_fails_at_build() {
        let options = TransformOptions {
            use_encryption: true,
            ..TransformOptions::default()
        };
        assert!(matches!(
            TransformPipeline::from_options(&options),
            Err(TransformError::MissingCredentials)
        ));
    }

    proptest! {
        #[test]
        fn arbitrary_payloads_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            for (_, pipeline) in all_shapes() {
                let encoded = pipeline.encode(&data).unwrap();
                prop_assert_eq!(pipeline.decode(&encoded).unwrap(), data.clone());
            }
        }
    }
}
