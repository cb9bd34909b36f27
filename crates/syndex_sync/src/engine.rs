//! The synchronization engine: fetch, decode, reconcile, commit.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::Transport;
use std::path::Path;
use std::sync::Arc;
use syndex_index::DocumentIndex;
use syndex_resource::{Record, Resource, ResourceError};
use tracing::{debug, info, warn};

/// Outcome counters for one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Records with no committed counterpart, buffered as creates.
    pub created: usize,
    /// Records whose committed counterpart had a different checksum.
    pub updated: usize,
    /// Records whose committed counterpart was byte-for-byte current.
    pub unchanged: usize,
}

impl ReconcileStats {
    /// Total records processed.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

/// Drives download-and-reconcile synchronization against a document index.
///
/// The engine never auto-resolves ambiguity: a record whose unique key
/// matches more than one committed document stops the pass with
/// [`SyncError::MergeConflict`]. Work buffered before the conflict stays
/// buffered; nothing commits until [`sync`](Self::sync) or an explicit
/// [`DocumentIndex::commit`].
pub struct SyncEngine {
    index: Arc<DocumentIndex>,
    transport: Arc<dyn Transport>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Creates an engine over an index and a transport.
    pub fn new(index: Arc<DocumentIndex>, transport: Arc<dyn Transport>, config: SyncConfig) -> Self {
        Self {
            index,
            transport,
            config,
        }
    }

    /// Returns the engine's index.
    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    /// Fetches and decodes remote records for a search term.
    ///
    /// The resource's resolver builds and authenticates the fetch target;
    /// the transport fetch retries per the retry configuration. Nothing is
    /// persisted.
    pub fn load_objects(&self, term: &str, resource: &Resource) -> SyncResult<Vec<Record>> {
        let target = resource.resolver().authenticate(resource.resolver().fetch_target(term));
        let payload = self.fetch_with_retry(&target)?;
        let payload = String::from_utf8(payload)
            .map_err(|e| ResourceError::decode(format!("payload is not valid UTF-8: {e}")))?;
        Ok(resource.decode(&payload)?)
    }

    /// Decodes records from a local file or directory instead of the
    /// network. Nothing is persisted.
    pub fn load_objects_from_path(
        &self,
        path: &Path,
        resource: &Resource,
    ) -> SyncResult<Vec<Record>> {
        Ok(self.index.load_objects_from_path(path, resource)?)
    }

    /// Recomputes each record's checksum and buffers the creates.
    pub fn create_objects(&self, records: &mut [Record], resource: &Resource) -> SyncResult<()> {
        self.stamp_checksums(records, resource);
        Ok(self.index.create_objects(records, resource)?)
    }

    /// Recomputes each record's checksum and buffers the updates.
    pub fn update_objects(&self, records: &mut [Record], resource: &Resource) -> SyncResult<()> {
        self.stamp_checksums(records, resource);
        Ok(self.index.update_objects(records, resource)?)
    }

    /// Buffers removal of the records' committed counterparts.
    pub fn delete_objects(&self, records: &[Record], resource: &Resource) -> SyncResult<()> {
        Ok(self.index.delete_objects(records, resource)?)
    }

    /// Reconciles incoming records against the committed document set.
    ///
    /// Per record: zero committed matches buffers a create, one match
    /// buffers an update only when the checksum differs, and more than one
    /// match is a [`SyncError::MergeConflict`]. Nothing commits here.
    pub fn reconcile(
        &self,
        records: &mut [Record],
        resource: &Resource,
    ) -> SyncResult<ReconcileStats> {
        let mut stats = ReconcileStats::default();
        let snapshot = self.index.snapshot();
        let mut seen = std::collections::HashSet::new();

        for record in records.iter_mut() {
            let checksum = resource.checksum(record);
            record.set_checksum(checksum.clone());
            let key = resource.unique_key(record)?.canonical();

            // A key already reconciled in this batch: the later record
            // replaces the earlier one.
            if !seen.insert(key.clone()) {
                self.index
                    .update_objects(std::slice::from_ref(record), resource)?;
                stats.updated += 1;
                continue;
            }

            let matches = snapshot.find_by_key(&key, resource);
            match matches.len() {
                0 => {
                    self.index
                        .create_objects(std::slice::from_ref(record), resource)?;
                    stats.created += 1;
                }
                1 => {
                    if matches[0].checksum() == checksum {
                        stats.unchanged += 1;
                    } else {
                        self.index
                            .update_objects(std::slice::from_ref(record), resource)?;
                        stats.updated += 1;
                    }
                }
                candidates => {
                    warn!(%key, candidates, "ambiguous match, stopping reconciliation");
                    return Err(SyncError::MergeConflict { key, candidates });
                }
            }
        }
        Ok(stats)
    }

    /// Fetches, reconciles, and commits in one pass.
    pub fn sync(&self, term: &str, resource: &Resource) -> SyncResult<ReconcileStats> {
        let mut records = self.load_objects(term, resource)?;
        let stats = self.reconcile(&mut records, resource)?;
        self.index.commit()?;
        info!(
            resource = resource.name(),
            created = stats.created,
            updated = stats.updated,
            unchanged = stats.unchanged,
            "synchronized"
        );
        Ok(stats)
    }

    fn stamp_checksums(&self, records: &mut [Record], resource: &Resource) {
        for record in records.iter_mut() {
            let checksum = resource.checksum(record);
            record.set_checksum(checksum);
        }
    }

    fn fetch_with_retry(&self, target: &syndex_resource::FetchTarget) -> SyncResult<Vec<u8>> {
        let retry = &self.config.retry;
        let mut attempt = 0u32;
        loop {
            let delay = retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            debug!(url = target.url(), attempt, "fetching");
            match self.transport.fetch(target, self.config.timeout) {
                Ok(payload) => return Ok(payload),
                Err(error) if error.is_retryable() && attempt + 1 < retry.max_attempts => {
                    warn!(url = target.url(), attempt, %error, "fetch failed, retrying");
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
