//! Process-wide catalog of resource descriptors.

use crate::error::{ResourceError, ResourceResult};
use crate::factory::{create_algorithm, create_resolver, ResolverSpec};
use crate::field::FieldDefinition;
use crate::resource::Resource;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// File extension recognized when scanning for configuration documents.
pub const RESOURCE_EXTENSION: &str = "rdef";

/// Outcome of loading a configuration document.
///
/// A bad entry rejects that entry only; the rest of the document still
/// registers.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names of the resources registered.
    pub registered: Vec<String>,
    /// Rejected entries with the error that rejected each.
    pub rejected: Vec<(String, ResourceError)>,
}

impl LoadReport {
    fn merge(&mut self, other: LoadReport) {
        self.registered.extend(other.registered);
        self.rejected.extend(other.rejected);
    }
}

/// One entry of a configuration document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceEntry {
    name: String,
    #[serde(default)]
    root_node: String,
    #[serde(default)]
    searchable_class: String,
    #[serde(default)]
    algorithm_class: String,
    #[serde(default)]
    resolver_class: String,
    #[serde(default)]
    unique_field: String,
    #[serde(default)]
    searchable_field: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    configurations: Vec<Value>,
}

/// Name-keyed catalog of [`Resource`] descriptors.
///
/// Read-mostly after startup; lookups share descriptors by `Arc`. Duplicate
/// registration is last-writer-wins.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: RwLock<HashMap<String, Arc<Resource>>>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under its own name.
    pub fn register(&self, resource: Resource) -> Arc<Resource> {
        let resource = Arc::new(resource);
        self.resources
            .write()
            .insert(resource.name().to_string(), Arc::clone(&resource));
        resource
    }

    /// Returns the descriptor registered under a name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<Resource>> {
        self.resources.read().get(name).cloned()
    }

    /// Returns all registered names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.resources.read().keys().cloned().collect()
    }

    /// Returns all registered descriptors.
    #[must_use]
    pub fn resources(&self) -> Vec<Arc<Resource>> {
        self.resources.read().values().cloned().collect()
    }

    /// Removes a descriptor by name, returning it if it was registered.
    pub fn remove(&self, name: &str) -> Option<Arc<Resource>> {
        self.resources.write().remove(name)
    }

    /// Returns the number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Parses a configuration document and registers its entries.
    ///
    /// The document has the shape
    /// `{"configurations": [{name, rootNode, searchableClass,
    /// algorithmClass, resolverClass, uniqueField, searchableField}, ...]}`.
    /// Each invalid entry is reported in the [`LoadReport`] and skipped.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the document itself is unreadable.
    pub fn register_from_reader(&self, mut reader: impl Read) -> ResourceResult<LoadReport> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        let document: ConfigDocument =
            serde_json::from_str(&text).map_err(|e| ResourceError::decode(e.to_string()))?;

        let mut report = LoadReport::default();
        for entry in document.configurations {
            let entry_name = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>")
                .to_string();
            match build_resource(entry) {
                Ok(resource) => {
                    debug!(name = resource.name(), "registered resource");
                    report.registered.push(resource.name().to_string());
                    self.register(resource);
                }
                Err(error) => {
                    warn!(name = %entry_name, %error, "rejecting configuration entry");
                    report.rejected.push((entry_name, error));
                }
            }
        }
        Ok(report)
    }

    /// Registers configuration documents from a file or directory.
    ///
    /// A file registers when it carries the `.rdef` extension; a directory
    /// is scanned recursively with the same filter.
    pub fn register_from_path(&self, path: &Path) -> ResourceResult<LoadReport> {
        let mut report = LoadReport::default();
        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                report.merge(self.register_from_path(&entry?.path())?);
            }
        } else if has_resource_extension(path) {
            let file = std::fs::File::open(path)?;
            report.merge(self.register_from_reader(file)?);
        }
        Ok(report)
    }
}

fn has_resource_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RESOURCE_EXTENSION))
}

/// Builds one descriptor from one configuration entry.
fn build_resource(entry: Value) -> ResourceResult<Resource> {
    let entry_name = entry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();

    let entry: ResourceEntry = serde_json::from_value(entry)
        .map_err(|e| ResourceError::configuration(&entry_name, e.to_string()))?;

    if entry.root_node.is_empty() {
        return Err(ResourceError::configuration(
            &entry.name,
            "missing root node",
        ));
    }
    if entry.algorithm_class.is_empty() {
        return Err(ResourceError::configuration(&entry.name, "missing algorithm"));
    }
    if entry.resolver_class.is_empty() {
        return Err(ResourceError::configuration(&entry.name, "missing resolver"));
    }

    let algorithm = create_algorithm(&entry.algorithm_class).ok_or_else(|| {
        ResourceError::configuration(
            &entry.name,
            format!("unknown algorithm `{}`", entry.algorithm_class),
        )
    })?;

    let unique_names: Vec<&str> = entry
        .unique_field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut fields = Vec::new();
    for (name, expression) in &entry.searchable_field {
        let expression = match expression {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        fields.push(FieldDefinition::new(
            name,
            expression,
            unique_names.contains(&name.as_str()),
        ));
    }

    let spec = ResolverSpec {
        algorithm: Arc::clone(&algorithm),
        unique_fields: fields.iter().filter(|f| f.is_unique()).cloned().collect(),
    };
    let resolver = create_resolver(&entry.resolver_class, &spec).ok_or_else(|| {
        ResourceError::configuration(
            &entry.name,
            format!("unknown resolver `{}`", entry.resolver_class),
        )
    })?;

    let mut resource = Resource::new(
        entry.name,
        entry.root_node,
        entry.searchable_class,
        algorithm,
        resolver,
    )?;
    for field in fields {
        resource.add_field(field);
    }
    Ok(resource)
}
