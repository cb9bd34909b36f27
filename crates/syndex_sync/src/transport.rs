//! Transport abstraction for fetching remote payloads.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use syndex_resource::FetchTarget;

/// Fetches the raw payload behind a resolved target.
///
/// Implementations own the wire protocol; the engine only sees bytes. A
/// fetch either returns the full payload or an error, never a partial
/// result.
pub trait Transport: Send + Sync {
    /// Fetches the payload, honoring the timeout.
    fn fetch(&self, target: &FetchTarget, timeout: Duration) -> SyncResult<Vec<u8>>;
}

/// An in-memory transport with scripted responses, for tests.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<VecDeque<SyncError>>,
    fetches: AtomicUsize,
}

impl MockTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the payload returned for a URL.
    pub fn script(&self, url: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.responses.lock().insert(url.into(), payload.into());
    }

    /// Queues an error to be returned before scripted responses are
    /// consulted. Each queued error is consumed by one fetch.
    pub fn fail_next(&self, error: SyncError) {
        self.failures.lock().push_back(error);
    }

    /// Returns how many fetches have been attempted.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn fetch(&self, target: &FetchTarget, _timeout: Duration) -> SyncResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        self.responses
            .lock()
            .get(target.url())
            .cloned()
            .ok_or_else(|| {
                SyncError::transport_fatal(format!("no scripted response for {}", target.url()))
            })
    }
}
