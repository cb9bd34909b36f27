//! Persisted document form of a record.

use crate::error::IndexResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use syndex_resource::{Record, Resource};

/// Reserved field holding the canonical unique key.
pub const KEY_FIELD: &str = "_key";
/// Reserved field holding the resource name the document belongs to.
pub const RESOURCE_FIELD: &str = "_resource";
/// Reserved field holding the record type identifier.
pub const TYPE_FIELD: &str = "_type";
/// Reserved field holding the content checksum.
pub const CHECKSUM_FIELD: &str = "_checksum";

/// The persisted form of a record: a flat field-name to values mapping plus
/// the reserved key, resource, type, and checksum fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexedDocument {
    fields: BTreeMap<String, Vec<String>>,
}

impl IndexedDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the document for a record under a resource descriptor.
    ///
    /// Extracts every declared field, then fills the reserved fields from
    /// the resource name, record type, unique key, and checksum. A record
    /// without a stored checksum gets one computed on the spot.
    pub fn from_record(record: &Record, resource: &Resource) -> IndexResult<Self> {
        let mut document = Self {
            fields: resource.extract_fields(record),
        };
        let key = resource.unique_key(record)?;
        let checksum = match record.checksum() {
            Some(checksum) => checksum.to_string(),
            None => resource.checksum(record),
        };
        document.insert(KEY_FIELD, vec![key.canonical()]);
        document.insert(RESOURCE_FIELD, vec![resource.name().to_string()]);
        document.insert(TYPE_FIELD, vec![resource.type_id().to_string()]);
        document.insert(CHECKSUM_FIELD, vec![checksum]);
        Ok(document)
    }

    /// Sets the values of a field, replacing any existing values.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.fields.insert(name.into(), values);
    }

    /// Returns the values of a field; missing fields are empty.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.fields.get(name).map_or(&[], Vec::as_slice)
    }

    /// Returns the first value of a field, if any.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// Returns the canonical unique key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.first(KEY_FIELD).unwrap_or("")
    }

    /// Returns the owning resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.first(RESOURCE_FIELD).unwrap_or("")
    }

    /// Returns the record type identifier.
    #[must_use]
    pub fn type_id(&self) -> &str {
        self.first(TYPE_FIELD).unwrap_or("")
    }

    /// Returns the content checksum.
    #[must_use]
    pub fn checksum(&self) -> &str {
        self.first(CHECKSUM_FIELD).unwrap_or("")
    }

    /// Returns all fields, reserved ones included.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// Returns true for the reserved field names.
    #[must_use]
    pub fn is_reserved(name: &str) -> bool {
        matches!(name, KEY_FIELD | RESOURCE_FIELD | TYPE_FIELD | CHECKSUM_FIELD)
    }
}
