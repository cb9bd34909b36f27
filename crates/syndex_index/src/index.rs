//! The document index: buffered CRUD over a persisted document set.

use crate::document::IndexedDocument;
use crate::error::{IndexError, IndexResult};
use crate::query::Query;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use syndex_resource::{Record, Resource};
use syndex_transform::{TransformOptions, TransformPipeline, TransformStore};
use tracing::{debug, info};

/// Name of the persisted document set inside the store.
pub const DOCUMENTS_FILE: &str = "documents.json";

/// A buffered structural mutation, applied at commit.
#[derive(Debug)]
enum PendingOp {
    Create(IndexedDocument),
    /// Replace every document matching (resource, key); insert when none do.
    Update {
        resource: String,
        key: String,
        document: IndexedDocument,
    },
    Delete {
        resource: String,
        key: String,
    },
}

/// CRUD and query façade over the persisted document store.
///
/// Reads run against the last committed snapshot; mutations buffer until
/// [`commit`](Self::commit). The pending buffer's lock serializes writers,
/// so one index instance enforces single-writer-per-store while readers
/// stay wait-free on an `Arc` of the committed set.
pub struct DocumentIndex {
    store: TransformStore,
    committed: RwLock<Arc<Vec<IndexedDocument>>>,
    pending: Mutex<Vec<PendingOp>>,
}

impl DocumentIndex {
    /// Opens the index over a directory with the given transform options.
    ///
    /// # Errors
    ///
    /// Fatal and surfaced here, never deferred: an unopenable directory, a
    /// transform that cannot be constructed, or a persisted document set
    /// that cannot be read back.
    pub fn open(dir: &Path, options: &TransformOptions) -> IndexResult<Self> {
        let pipeline = TransformPipeline::from_options(options)?;
        let store = TransformStore::open(dir, pipeline)?;

        let documents: Vec<IndexedDocument> = match store.get(DOCUMENTS_FILE)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| IndexError::corrupt(e.to_string()))?,
            None => Vec::new(),
        };

        info!(
            dir = %dir.display(),
            documents = documents.len(),
            "opened document index"
        );
        Ok(Self {
            store,
            committed: RwLock::new(Arc::new(documents)),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Decodes a payload into records via the resource's algorithm.
    ///
    /// Pure: nothing is persisted.
    pub fn load_objects(&self, payload: &str, resource: &Resource) -> IndexResult<Vec<Record>> {
        Ok(resource.decode(payload)?)
    }

    /// Decodes records from a file, or recursively from every file in a
    /// directory.
    ///
    /// Pure: nothing is persisted.
    pub fn load_objects_from_path(
        &self,
        path: &Path,
        resource: &Resource,
    ) -> IndexResult<Vec<Record>> {
        let mut records = Vec::new();
        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                records.extend(self.load_objects_from_path(&entry?.path(), resource)?);
            }
        } else {
            let payload = std::fs::read_to_string(path)?;
            records.extend(resource.decode(&payload)?);
        }
        Ok(records)
    }

    /// Buffers the records as new documents.
    ///
    /// No duplicate check is made; deduplication is the caller's concern
    /// (the synchronization engine reconciles before creating).
    pub fn create_objects(&self, records: &[Record], resource: &Resource) -> IndexResult<()> {
        let mut pending = self.pending.lock();
        for record in records {
            let document = IndexedDocument::from_record(record, resource)?;
            pending.push(PendingOp::Create(document));
        }
        Ok(())
    }

    /// Buffers replacement of the documents matching each record's unique
    /// key, scoped to the resource. Upserts when none match.
    pub fn update_objects(&self, records: &[Record], resource: &Resource) -> IndexResult<()> {
        let mut pending = self.pending.lock();
        for record in records {
            let document = IndexedDocument::from_record(record, resource)?;
            pending.push(PendingOp::Update {
                resource: resource.name().to_string(),
                key: document.key().to_string(),
                document,
            });
        }
        Ok(())
    }

    /// Buffers removal of the documents matching each record's unique key.
    /// A key that matches nothing is a silent no-op.
    pub fn delete_objects(&self, records: &[Record], resource: &Resource) -> IndexResult<()> {
        let mut pending = self.pending.lock();
        for record in records {
            let key = resource.unique_key(record)?.canonical();
            pending.push(PendingOp::Delete {
                resource: resource.name().to_string(),
                key,
            });
        }
        Ok(())
    }

    /// Applies the pending buffer to a fresh snapshot and persists it.
    ///
    /// Readers opened before the commit keep their snapshot; sessions
    /// opened afterwards see the new state.
    pub fn commit(&self) -> IndexResult<()> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(());
        }

        let mut documents = self.committed.read().as_ref().clone();
        let applied = pending.len();
        for op in pending.drain(..) {
            match op {
                PendingOp::Create(document) => documents.push(document),
                PendingOp::Update {
                    resource,
                    key,
                    document,
                } => {
                    documents.retain(|d| !(d.resource() == resource && d.key() == key));
                    documents.push(document);
                }
                PendingOp::Delete { resource, key } => {
                    documents.retain(|d| !(d.resource() == resource && d.key() == key));
                }
            }
        }

        let bytes = serde_json::to_vec(&documents)
            .map_err(|e| IndexError::corrupt(e.to_string()))?;
        self.store.put(DOCUMENTS_FILE, &bytes)?;

        *self.committed.write() = Arc::new(documents);
        debug!(operations = applied, "committed document index");
        Ok(())
    }

    /// Opens a read session pinned to the current committed state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            documents: Arc::clone(&self.committed.read()),
        }
    }

    /// Resolves a document by its canonical unique key, scoped to the
    /// resource. Absence is a normal `None`.
    pub fn get_object(
        &self,
        key: &str,
        resource: &Resource,
    ) -> IndexResult<Option<IndexedDocument>> {
        self.snapshot().get_object(key, resource)
    }

    /// Resolves a document by key, scoped to a record type identifier.
    pub fn get_object_of_type(
        &self,
        key: &str,
        type_id: &str,
    ) -> IndexResult<Option<IndexedDocument>> {
        self.snapshot().get_object_of_type(key, type_id)
    }

    /// Runs a query scoped to the resource. An empty result set is valid.
    pub fn get_objects(&self, query: &str, resource: &Resource) -> IndexResult<Vec<IndexedDocument>> {
        self.snapshot().get_objects(query, resource)
    }

    /// Runs a query scoped to a record type identifier.
    pub fn get_objects_of_type(
        &self,
        query: &str,
        type_id: &str,
    ) -> IndexResult<Vec<IndexedDocument>> {
        self.snapshot().get_objects_of_type(query, type_id)
    }

    /// Returns every committed document matching a canonical key under a
    /// resource. Used by reconciliation to detect ambiguous matches.
    #[must_use]
    pub fn find_by_key(&self, key: &str, resource: &Resource) -> Vec<IndexedDocument> {
        self.snapshot().find_by_key(key, resource)
    }

    /// Returns the number of committed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.read().len()
    }

    /// Returns true if no documents are committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.read().is_empty()
    }
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("committed", &self.len())
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

/// A read session over the committed state at the time it was opened.
///
/// Later commits never become visible inside an open snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    documents: Arc<Vec<IndexedDocument>>,
}

impl Snapshot {
    /// Resolves a document by canonical key, scoped to the resource.
    pub fn get_object(
        &self,
        key: &str,
        resource: &Resource,
    ) -> IndexResult<Option<IndexedDocument>> {
        Ok(self.find_by_key(key, resource).into_iter().next())
    }

    /// Resolves a document by canonical key, scoped to a type identifier.
    pub fn get_object_of_type(
        &self,
        key: &str,
        type_id: &str,
    ) -> IndexResult<Option<IndexedDocument>> {
        Ok(self
            .documents
            .iter()
            .find(|d| d.type_id() == type_id && d.key() == key)
            .cloned())
    }

    /// Runs a query scoped to the resource.
    pub fn get_objects(&self, query: &str, resource: &Resource) -> IndexResult<Vec<IndexedDocument>> {
        let query = Query::parse(query)?;
        Ok(self
            .documents
            .iter()
            .filter(|d| d.resource() == resource.name() && query.matches(d))
            .cloned()
            .collect())
    }

    /// Runs a query scoped to a record type identifier.
    pub fn get_objects_of_type(
        &self,
        query: &str,
        type_id: &str,
    ) -> IndexResult<Vec<IndexedDocument>> {
        let query = Query::parse(query)?;
        Ok(self
            .documents
            .iter()
            .filter(|d| d.type_id() == type_id && query.matches(d))
            .cloned()
            .collect())
    }

    /// Returns every document matching a canonical key under a resource.
    #[must_use]
    pub fn find_by_key(&self, key: &str, resource: &Resource) -> Vec<IndexedDocument> {
        self.documents
            .iter()
            .filter(|d| d.resource() == resource.name() && d.key() == key)
            .cloned()
            .collect()
    }

    /// Returns the number of documents in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the snapshot holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use syndex_resource::{Algorithm, FieldDefinition, FieldResolver, JsonAlgorithm};

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
            .with_field("familyName", "$['familyName']", false)
    }

    fn record(uuid: &str, given: &str) -> Record {
        Record::new(json!({"uuid": uuid, "givenName": given}))
    }

    fn open_index(dir: &Path) -> DocumentIndex {
        DocumentIndex::open(dir, &TransformOptions::default()).unwrap()
    }

    #[test]
    fn create_commit_retrieve_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .create_objects(&[record("abc-1", "Tom")], &resource)
            .unwrap();
        index.commit().unwrap();

        let document = index.get_object("abc-1", &resource).unwrap().unwrap();
        assert_eq!(document.values("givenName"), ["Tom"]);
        assert_eq!(document.key(), "abc-1");
    }

    #[test]
    fn uncommitted_writes_are_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .create_objects(&[record("abc-1", "Tom")], &resource)
            .unwrap();

        assert!(index.get_object("abc-1", &resource).unwrap().is_none());
        index.commit().unwrap();
        assert!(index.get_object("abc-1", &resource).unwrap().is_some());
    }

    #[test]
    fn snapshot_is_stable_across_commits() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .create_objects(&[record("abc-1", "Tom")], &resource)
            .unwrap();
        index.commit().unwrap();

        let snapshot = index.snapshot();
        index
            .create_objects(&[record("abc-2", "Anna")], &resource)
            .unwrap();
        index.commit().unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn update_replaces_matching_document() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .create_objects(&[record("abc-1", "Tom")], &resource)
            .unwrap();
        index.commit().unwrap();

        index
            .update_objects(&[record("abc-1", "Thomas")], &resource)
            .unwrap();
        index.commit().unwrap();

        assert_eq!(index.len(), 1);
        let document = index.get_object("abc-1", &resource).unwrap().unwrap();
        assert_eq!(document.values("givenName"), ["Thomas"]);
    }

    #[test]
    fn update_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .create_objects(&[record("abc-1", "Tom")], &resource)
            .unwrap();
        index.commit().unwrap();

        for _ in 0..2 {
            index
                .update_objects(&[record("abc-1", "Thomas")], &resource)
                .unwrap();
            index.commit().unwrap();
        }

        assert_eq!(index.len(), 1);
        let document = index.get_object("abc-1", &resource).unwrap().unwrap();
        assert_eq!(document.values("givenName"), ["Thomas"]);
    }

    #[test]
    fn update_upserts_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .update_objects(&[record("new-1", "Fresh")], &resource)
            .unwrap();
        index.commit().unwrap();

        assert!(index.get_object("new-1", &resource).unwrap().is_some());
    }

    #[test]
    fn delete_removes_and_later_lookups_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .create_objects(&[record("abc-1", "Tom")], &resource)
            .unwrap();
        index.commit().unwrap();

        index
            .delete_objects(&[record("abc-1", "Tom")], &resource)
            .unwrap();
        index.commit().unwrap();

        assert!(index.get_object("abc-1", &resource).unwrap().is_none());
        assert!(index
            .get_objects("givenName:Tom", &resource)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_of_absent_key_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        index
            .delete_objects(&[record("ghost", "Nobody")], &resource)
            .unwrap();
        index.commit().unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn queries_are_scoped_to_the_resource() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let patients = patient_resource();

        let algorithm: Arc<dyn Algorithm> = Arc::new(JsonAlgorithm::new());
        let resolver = Arc::new(FieldResolver::new(
            "",
            Arc::clone(&algorithm),
            vec![FieldDefinition::new("uuid", "$['uuid']", true)],
        ));
        let visits = Resource::new("Visit Resource", "$", "visit", algorithm, resolver)
            .unwrap()
            .with_field("uuid", "$['uuid']", true)
            .with_field("givenName", "$['givenName']", false);

        index
            .create_objects(&[record("abc-1", "Tom")], &patients)
            .unwrap();
        index
            .create_objects(&[record("abc-1", "Tom")], &visits)
            .unwrap();
        index.commit().unwrap();

        assert_eq!(index.get_objects("givenName:Tom", &patients).unwrap().len(), 1);
        assert_eq!(index.get_objects_of_type("givenName:Tom", "visit").unwrap().len(), 1);
        assert!(index
            .get_object_of_type("abc-1", "patient")
            .unwrap()
            .is_some());
    }

    #[test]
    fn malformed_query_is_a_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        let result = index.get_objects("givenName:", &resource);
        assert!(matches!(result, Err(IndexError::QuerySyntax { .. })));
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let resource = patient_resource();
        {
            let index = open_index(dir.path());
            index
                .create_objects(&[record("abc-1", "Tom")], &resource)
                .unwrap();
            index.commit().unwrap();
        }

        let reopened = open_index(dir.path());
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get_object("abc-1", &resource).unwrap().is_some());
    }

    #[test]
    fn corrupt_document_set_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DOCUMENTS_FILE), b"{not json").unwrap();
        let result = DocumentIndex::open(dir.path(), &TransformOptions::default());
        assert!(matches!(result, Err(IndexError::Corrupt { .. })));
    }

    #[test]
    fn load_objects_is_pure() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path());
        let resource = patient_resource();

        let records = index
            .load_objects(r#"{"uuid": "abc-1", "givenName": "Tom"}"#, &resource)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(index.is_empty());
    }

    #[test]
    fn load_objects_from_directory_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        let nested = corpus.join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            corpus.join("one.json"),
            r#"{"uuid": "a", "givenName": "Tom"}"#,
        )
        .unwrap();
        std::fs::write(
            nested.join("two.json"),
            r#"{"uuid": "b", "givenName": "Anna"}"#,
        )
        .unwrap();

        let index = open_index(&dir.path().join("store"));
        let resource = patient_resource();
        let records = index.load_objects_from_path(&corpus, &resource).unwrap();
        assert_eq!(records.len(), 2);
    }
}
