//! # SynDex Transform
//!
//! Composable byte-stream transforms layered under the document store.
//!
//! A [`TransformPipeline`] wraps a raw directory with zero or more symmetric
//! transforms chosen by [`TransformOptions`] (compression and encryption,
//! both off by default). The write path applies transforms in declaration
//! order (compress, then encrypt); the read path applies the exact inverse
//! order (decrypt, then decompress).
//!
//! ## Design Principles
//!
//! - Transforms are **opaque byte codecs**: they do not interpret content
//! - A transform that cannot be constructed fails at open time, never at
//!   first I/O
//! - Transforms run inline on the calling thread; callers batch or
//!   parallelize above this layer if they need overlap
//!
//! ## Example
//!
//! ```rust
//! use syndex_transform::{TransformOptions, TransformPipeline};
//!
//! let pipeline = TransformPipeline::from_options(&TransformOptions::default()).unwrap();
//! let encoded = pipeline.encode(b"hello").unwrap();
//! assert_eq!(pipeline.decode(&encoded).unwrap(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compress;
mod encrypt;
mod error;
mod pipeline;
mod store;
mod transform;

pub use compress::DeflateTransform;
pub use encrypt::{CipherTransform, Credentials, KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
pub use error::{TransformError, TransformResult};
pub use pipeline::{TransformOptions, TransformPipeline};
pub use store::TransformStore;
pub use transform::DataTransform;
