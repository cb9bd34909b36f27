//! Records and content checksums.

use crate::field::FieldValues;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// A decoded domain object.
///
/// Records are created transiently by [`Algorithm::decode`](crate::Algorithm)
/// and become indexed documents on write. Identity for reconciliation is the
/// set of designated unique-field values, never object identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    body: Value,
    checksum: Option<String>,
}

impl Record {
    /// Creates a record from a decoded body.
    pub fn new(body: Value) -> Self {
        Self {
            body,
            checksum: None,
        }
    }

    /// Returns the decoded body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the content checksum, if one has been computed.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Stores a content checksum on the record.
    pub fn set_checksum(&mut self, checksum: impl Into<String>) {
        self.checksum = Some(checksum.into());
    }
}

impl From<Value> for Record {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}

/// Computes the content fingerprint over canonical field values.
///
/// The fingerprint is SHA-256 over field names in sorted order with their
/// values in extraction order, hex-encoded. Two records extracting the same
/// field values always produce the same checksum.
#[must_use]
pub fn checksum_of(fields: &FieldValues) -> String {
    let mut hasher = Sha256::new();
    for (name, values) in fields {
        hasher.update(name.as_bytes());
        hasher.update([0x1e]);
        for value in values {
            hasher.update(value.as_bytes());
            hasher.update([0x1f]);
        }
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
