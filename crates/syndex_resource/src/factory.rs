//! Compile-time factory registry for configuration-supplied identifiers.
//!
//! Configuration documents select algorithms and resolvers by string
//! identifier. Instead of runtime type lookup, each identifier maps to a
//! factory function registered at startup. The built-in identifiers `json`
//! (algorithm) and `rest` (resolver) are always available.

use crate::algorithm::{Algorithm, JsonAlgorithm};
use crate::field::FieldDefinition;
use crate::resolver::{FieldResolver, Resolver};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Context handed to a resolver factory.
///
/// Carries everything a resolver needs from the configuration entry it is
/// created for: the entry's algorithm and its unique field definitions.
#[derive(Clone)]
pub struct ResolverSpec {
    /// The algorithm of the resource being configured.
    pub algorithm: Arc<dyn Algorithm>,
    /// The field definitions flagged unique for the resource.
    pub unique_fields: Vec<FieldDefinition>,
}

/// Constructs an algorithm from a configuration identifier.
pub type AlgorithmFactory = fn() -> Arc<dyn Algorithm>;

/// Constructs a resolver from a configuration identifier.
pub type ResolverFactory = fn(&ResolverSpec) -> Arc<dyn Resolver>;

static ALGORITHMS: LazyLock<RwLock<HashMap<String, AlgorithmFactory>>> = LazyLock::new(|| {
    let mut map: HashMap<String, AlgorithmFactory> = HashMap::new();
    map.insert("json".to_string(), || Arc::new(JsonAlgorithm::new()));
    RwLock::new(map)
});

static RESOLVERS: LazyLock<RwLock<HashMap<String, ResolverFactory>>> = LazyLock::new(|| {
    let mut map: HashMap<String, ResolverFactory> = HashMap::new();
    map.insert("rest".to_string(), |spec| {
        Arc::new(FieldResolver::new(
            "",
            Arc::clone(&spec.algorithm),
            spec.unique_fields.clone(),
        ))
    });
    RwLock::new(map)
});

/// Registers an algorithm factory under an identifier.
///
/// Last writer wins on duplicate identifiers.
pub fn register_algorithm(id: impl Into<String>, factory: AlgorithmFactory) {
    ALGORITHMS.write().insert(id.into(), factory);
}

/// Registers a resolver factory under an identifier.
///
/// Last writer wins on duplicate identifiers.
pub fn register_resolver(id: impl Into<String>, factory: ResolverFactory) {
    RESOLVERS.write().insert(id.into(), factory);
}

/// Creates the algorithm registered under an identifier.
pub fn create_algorithm(id: &str) -> Option<Arc<dyn Algorithm>> {
    ALGORITHMS.read().get(id).map(|factory| factory())
}

/// Creates the resolver registered under an identifier.
pub fn create_resolver(id: &str, spec: &ResolverSpec) -> Option<Arc<dyn Resolver>> {
    RESOLVERS.read().get(id).map(|factory| factory(spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    #[test]
    fn builtin_json_algorithm() {
        let algorithm = create_algorithm("json").unwrap();
        let records = algorithm.decode(r#"{"uuid": "a"}"#, "$").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn builtin_rest_resolver() {
        let spec = ResolverSpec {
            algorithm: create_algorithm("json").unwrap(),
            unique_fields: vec![FieldDefinition::new("uuid", "$['uuid']", true)],
        };
        let resolver = create_resolver("rest", &spec).unwrap();
        let record = Record::new(json!({"uuid": "abc"}));
        assert_eq!(resolver.unique_key(&record).unwrap().canonical(), "abc");
    }

    #[test]
    fn unknown_identifier_yields_none() {
        assert!(create_algorithm("no-such-algorithm").is_none());
    }

    #[test]
    fn custom_algorithm_registration() {
        register_algorithm("custom-json", || Arc::new(JsonAlgorithm::new()));
        assert!(create_algorithm("custom-json").is_some());
    }
}
