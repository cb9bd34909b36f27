//! Resource descriptors.

use crate::algorithm::Algorithm;
use crate::error::{ResourceError, ResourceResult};
use crate::field::{FieldDefinition, FieldValues};
use crate::record::{checksum_of, Record};
use crate::resolver::{Resolver, UniqueKey};
use std::sync::Arc;
use tracing::warn;

/// A declarative binding of a record type to its extraction and identity
/// policy.
///
/// A resource bundles the root path into raw payloads, the record type
/// identifier, the decoding [`Algorithm`], the [`Resolver`], and the ordered
/// field definitions. Resources are immutable once registered and live for
/// the process lifetime.
pub struct Resource {
    name: String,
    root_path: String,
    type_id: String,
    algorithm: Arc<dyn Algorithm>,
    resolver: Arc<dyn Resolver>,
    fields: Vec<FieldDefinition>,
}

impl Resource {
    /// Creates a resource descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidArgument`] if `name` or `root_path`
    /// is empty.
    pub fn new(
        name: impl Into<String>,
        root_path: impl Into<String>,
        type_id: impl Into<String>,
        algorithm: Arc<dyn Algorithm>,
        resolver: Arc<dyn Resolver>,
    ) -> ResourceResult<Self> {
        let name = name.into();
        let root_path = root_path.into();
        if name.is_empty() {
            return Err(ResourceError::invalid_argument("resource name is empty"));
        }
        if root_path.is_empty() {
            return Err(ResourceError::invalid_argument(format!(
                "resource `{name}` has an empty root path"
            )));
        }
        Ok(Self {
            name,
            root_path,
            type_id: type_id.into(),
            algorithm,
            resolver,
            fields: Vec::new(),
        })
    }

    /// Adds a field definition, replacing any earlier definition with the
    /// same name.
    pub fn add_field(&mut self, field: FieldDefinition) {
        self.fields.retain(|f| f.name() != field.name());
        self.fields.push(field);
    }

    /// Builder-style [`add_field`](Self::add_field).
    #[must_use]
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        expression: impl Into<String>,
        unique: bool,
    ) -> Self {
        self.add_field(FieldDefinition::new(name, expression, unique));
        self
    }

    /// Returns the registry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the root path into raw payloads.
    #[must_use]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Returns the record type identifier.
    #[must_use]
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Returns the decoding algorithm.
    #[must_use]
    pub fn algorithm(&self) -> &Arc<dyn Algorithm> {
        &self.algorithm
    }

    /// Returns the resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }

    /// Returns the ordered field definitions.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Returns the field definitions flagged unique.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.is_unique())
    }

    /// Returns the definition for a field name, if declared.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Decodes a raw payload into records using this resource's algorithm
    /// and root path.
    pub fn decode(&self, payload: &str) -> ResourceResult<Vec<Record>> {
        self.algorithm.decode(payload, &self.root_path)
    }

    /// Extracts all declared fields from a record.
    ///
    /// A field whose expression fails is logged and skipped; the remaining
    /// fields still extract. Missing data extracts zero values.
    pub fn extract_fields(&self, record: &Record) -> FieldValues {
        let mut values = FieldValues::new();
        for field in &self.fields {
            match self.algorithm.extract(record, field) {
                Ok(extracted) => {
                    values.insert(field.name().to_string(), extracted);
                }
                Err(error) => {
                    warn!(
                        resource = %self.name,
                        field = field.name(),
                        %error,
                        "skipping field with bad extraction expression"
                    );
                }
            }
        }
        values
    }

    /// Computes the unique key of a record via the resolver.
    pub fn unique_key(&self, record: &Record) -> ResourceResult<UniqueKey> {
        self.resolver.unique_key(record)
    }

    /// Computes the content checksum over the record's extracted fields.
    #[must_use]
    pub fn checksum(&self, record: &Record) -> String {
        checksum_of(&self.extract_fields(record))
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("root_path", &self.root_path)
            .field("type_id", &self.type_id)
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::JsonAlgorithm;
    use crate::resolver::FieldResolver;
    use serde_json::json;

    fn patient_resource() -> Resource {
        let algorithm: Arc<dyn Algorithm> = Arc::new(JsonAlgorithm::new());
        let resolver = Arc::new(FieldResolver::new(
            "",
            Arc::clone(&algorithm),
            vec![FieldDefinition::new("uuid", "$['uuid']", true)],
        ));
        Resource::new("Patient Resource", "$", "patient", algorithm, resolver)
            .unwrap()
            .with_field("uuid", "$['uuid']", true)
            .with_field("givenName", "$['givenName']", false)
    }

    #[test]
    fn empty_name_is_rejected() {
        let algorithm: Arc<dyn Algorithm> = Arc::new(JsonAlgorithm::new());
        let resolver = Arc::new(FieldResolver::new("", Arc::clone(&algorithm), vec![]));
        let result = Resource::new("", "$", "patient", algorithm, resolver);
        assert!(matches!(result, Err(ResourceError::InvalidArgument { .. })));
    }

    #[test]
    fn empty_root_path_is_rejected() {
        let algorithm: Arc<dyn Algorithm> = Arc::new(JsonAlgorithm::new());
        let resolver = Arc::new(FieldResolver::new("", Arc::clone(&algorithm), vec![]));
        let result = Resource::new("Patient", "", "patient", algorithm, resolver);
        assert!(matches!(result, Err(ResourceError::InvalidArgument { .. })));
    }

    #[test]
    fn duplicate_field_name_replaces_earlier_definition() {
        let resource = patient_resource().with_field("givenName", "$['name']", false);
        assert_eq!(resource.fields().len(), 2);
        assert_eq!(
            resource.field("givenName").unwrap().expression(),
            "$['name']"
        );
    }

    #[test]
    fn extract_fields_returns_declared_fields() {
        let resource = patient_resource();
        let record = Record::new(json!({"uuid": "abc-1", "givenName": "Tom"}));
        let values = resource.extract_fields(&record);
        assert_eq!(values["uuid"], vec!["abc-1"]);
        assert_eq!(values["givenName"], vec!["Tom"]);
    }

    #[test]
    fn extract_fields_skips_bad_expression_only() {
        let resource = patient_resource().with_field("broken", "$['oops", false);
        let record = Record::new(json!({"uuid": "abc-1", "givenName": "Tom"}));
        let values = resource.extract_fields(&record);
        assert!(values.contains_key("uuid"));
        assert!(!values.contains_key("broken"));
    }

    #[test]
    fn checksum_tracks_field_values() {
        let resource = patient_resource();
        let tom = Record::new(json!({"uuid": "abc-1", "givenName": "Tom"}));
        let thomas = Record::new(json!({"uuid": "abc-1", "givenName": "Thomas"}));
        assert_ne!(resource.checksum(&tom), resource.checksum(&thomas));
        assert_eq!(resource.checksum(&tom), resource.checksum(&tom));
    }

    #[test]
    fn unique_key_via_resolver() {
        let resource = patient_resource();
        let record = Record::new(json!({"uuid": "abc-1"}));
        assert_eq!(resource.unique_key(&record).unwrap().canonical(), "abc-1");
    }
}
