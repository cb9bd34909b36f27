//! # SynDex Index
//!
//! CRUD and query façade over the persisted document store.
//!
//! A [`DocumentIndex`] holds [`IndexedDocument`]s - the flattened,
//! field-mapped form of decoded records - and persists them through the
//! transform pipeline. Mutations are buffered until [`commit`]
//! (snapshot semantics): readers see the committed state as of their own
//! open, never an in-flight write.
//!
//! [`commit`]: DocumentIndex::commit
//!
//! ## Key Invariants
//!
//! - Concurrent readers, serialized structural mutation (single writer per
//!   physical store)
//! - An uncommitted write is invisible to every reader and query
//! - Store open failure (bad directory, bad transform config) is fatal and
//!   surfaced at open, never deferred
//! - An absent document is a normal `None`, never an error

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod index;
mod query;

pub use document::{IndexedDocument, CHECKSUM_FIELD, KEY_FIELD, RESOURCE_FIELD, TYPE_FIELD};
pub use error::{IndexError, IndexResult};
pub use index::{DocumentIndex, Snapshot, DOCUMENTS_FILE};
pub use query::Query;
