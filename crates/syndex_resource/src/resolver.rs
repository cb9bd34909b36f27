//! Identity and remote-access policy for resources.

use crate::algorithm::Algorithm;
use crate::error::{ResourceError, ResourceResult};
use crate::field::FieldDefinition;
use crate::record::Record;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The unique-field values identifying a record for reconciliation.
///
/// Keys are ordered by field name so the canonical form is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniqueKey {
    values: BTreeMap<String, String>,
}

impl UniqueKey {
    /// Creates an empty unique key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field value to the key.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    /// Returns the value for a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Returns true if the key holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of fields in the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterates over (field, value) pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The canonical single-string form: values joined by `|` in
    /// field-name order. Used as the reserved primary-key field.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.values
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// An opaque fetch target interpreted by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    url: String,
    headers: Vec<(String, String)>,
}

impl FetchTarget {
    /// Creates a fetch target for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Attaches a header pair.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the attached headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Per-resource identity and remote-access policy.
pub trait Resolver: Send + Sync {
    /// Computes the unique key of a record.
    ///
    /// Deterministic, and references only fields flagged unique.
    fn unique_key(&self, record: &Record) -> ResourceResult<UniqueKey>;

    /// Builds the fetch target for a search term.
    fn fetch_target(&self, search_term: &str) -> FetchTarget;

    /// Augments a fetch target with credentials.
    ///
    /// The default implementation passes the target through unchanged;
    /// override to delegate to a secure-channel collaborator.
    fn authenticate(&self, target: FetchTarget) -> FetchTarget {
        target
    }
}

/// The default [`Resolver`], driven by the descriptor's unique fields.
///
/// The unique key is computed by extracting each unique field with the
/// resource's own algorithm; the fetch target appends the search term to a
/// base URL (or is the term itself when no base URL is configured).
pub struct FieldResolver {
    base_url: String,
    algorithm: Arc<dyn Algorithm>,
    unique_fields: Vec<FieldDefinition>,
}

impl FieldResolver {
    /// Creates a resolver over the given unique field definitions.
    pub fn new(
        base_url: impl Into<String>,
        algorithm: Arc<dyn Algorithm>,
        unique_fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            algorithm,
            unique_fields,
        }
    }
}

impl Resolver for FieldResolver {
    fn unique_key(&self, record: &Record) -> ResourceResult<UniqueKey> {
        if self.unique_fields.is_empty() {
            return Err(ResourceError::invalid_argument(
                "resolver declares no unique fields",
            ));
        }
        let mut key = UniqueKey::new();
        for field in &self.unique_fields {
            let values = self.algorithm.extract(record, field)?;
            match values.into_iter().next() {
                Some(value) => key.insert(field.name(), value),
                None => {
                    return Err(ResourceError::MissingUniqueValue {
                        field: field.name().to_string(),
                    })
                }
            }
        }
        Ok(key)
    }

    fn fetch_target(&self, search_term: &str) -> FetchTarget {
        if self.base_url.is_empty() {
            FetchTarget::new(search_term)
        } else {
            FetchTarget::new(format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                search_term
            ))
        }
    }
}

impl std::fmt::Debug for FieldResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldResolver")
            .field("base_url", &self.base_url)
            .field("unique_fields", &self.unique_fields)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::JsonAlgorithm;
    use serde_json::json;

    fn resolver(base_url: &str) -> FieldResolver {
        FieldResolver::new(
            base_url,
            Arc::new(JsonAlgorithm::new()),
            vec![FieldDefinition::new("uuid", "$['uuid']", true)],
        )
    }

    #[test]
    fn unique_key_from_record() {
        let record = Record::new(json!({"uuid": "abc-1"}));
        let key = resolver("").unique_key(&record).unwrap();
        assert_eq!(key.get("uuid"), Some("abc-1"));
        assert_eq!(key.canonical(), "abc-1");
    }

    #[test]
    fn unique_key_is_deterministic() {
        let record = Record::new(json!({"uuid": "abc-1"}));
        let resolver = resolver("");
        assert_eq!(
            resolver.unique_key(&record).unwrap(),
            resolver.unique_key(&record).unwrap()
        );
    }

    #[test]
    fn missing_unique_value_is_an_error() {
        let record = Record::new(json!({"other": 1}));
        let result = resolver("").unique_key(&record);
        assert!(matches!(
            result,
            Err(ResourceError::MissingUniqueValue { .. })
        ));
    }

    #[test]
    fn canonical_joins_values_in_field_order() {
        let mut key = UniqueKey::new();
        key.insert("system", "local");
        key.insert("id", "42");
        // field-name order: id before system
        assert_eq!(key.canonical(), "42|local");
    }

    #[test]
    fn fetch_target_appends_term_to_base() {
        let target = resolver("https://records.example.com/ws/").fetch_target("abc-1");
        assert_eq!(target.url(), "https://records.example.com/ws/abc-1");
    }

    #[test]
    fn fetch_target_without_base_is_the_term() {
        let target = resolver("").fetch_target("https://elsewhere/abc");
        assert_eq!(target.url(), "https://elsewhere/abc");
    }

    #[test]
    fn authenticate_defaults_to_identity() {
        let resolver = resolver("");
        let target = FetchTarget::new("https://x").with_header("Accept", "application/json");
        assert_eq!(resolver.authenticate(target.clone()), target);
    }
}
