//! Field definitions for resource descriptors.

use std::collections::BTreeMap;

/// Extracted field values: field name to ordered values.
///
/// A field may extract zero values (missing data is not an error) or
/// several (the expression fanned out over a collection).
pub type FieldValues = BTreeMap<String, Vec<String>>;

/// A declarative rule for extracting one field from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    name: String,
    expression: String,
    unique: bool,
}

impl FieldDefinition {
    /// Creates a new field definition.
    pub fn new(name: impl Into<String>, expression: impl Into<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            unique,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the extraction expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns true if the field participates in the record's unique key.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }
}
