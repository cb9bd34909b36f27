//! Download-and-reconcile synchronization for SynDex.
//!
//! The engine fetches remote payloads through a pluggable [`Transport`],
//! decodes them via the resource's algorithm, and reconciles the records
//! against the committed document set: absent records are created, changed
//! records are updated by checksum comparison, and ambiguous matches stop
//! the pass with [`SyncError::MergeConflict`] rather than guessing.
//!
//! # Design Principles
//!
//! - **Explicit dependencies**: the engine is constructed from its index,
//!   transport, and [`SyncConfig`]; nothing is ambient.
//! - **All-or-nothing fetches**: a fetch either yields the full payload or
//!   an error, and retryable failures retry the whole fetch.
//! - **No silent merges**: more than one committed match for a record's
//!   unique key is surfaced to the caller, never auto-resolved.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod transport;

pub use config::{ProxyConfig, RetryConfig, SyncConfig};
pub use engine::{ReconcileStats, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use transport::{MockTransport, Transport};
