//! # SynDex Resource
//!
//! Resource descriptors and decoding contracts for SynDex.
//!
//! This crate provides:
//! - [`Record`] - a decoded domain object with a content checksum
//! - [`FieldDefinition`] - declarative field extraction rules
//! - [`Algorithm`] - payload decoding and field extraction contract
//! - [`Resolver`] - identity and remote-access policy contract
//! - [`Resource`] - the declarative bundle tying them together
//! - [`ResourceRegistry`] - process-wide catalog of resources, loadable
//!   from configuration documents
//! - a compile-time factory registry mapping configuration identifiers
//!   to [`Algorithm`] and [`Resolver`] constructors
//!
//! ## Design Principles
//!
//! - Descriptors are immutable once registered and live for the process
//! - Records are transient: produced by decoding, consumed by indexing
//! - A bad configuration entry rejects that entry only, never the batch
//! - A bad extraction expression isolates that field only

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod algorithm;
mod error;
mod factory;
mod field;
mod record;
mod registry;
mod resolver;
mod resource;

pub use algorithm::{Algorithm, JsonAlgorithm};
pub use error::{ResourceError, ResourceResult};
pub use factory::{
    create_algorithm, create_resolver, register_algorithm, register_resolver, AlgorithmFactory,
    ResolverFactory, ResolverSpec,
};
pub use field::{FieldDefinition, FieldValues};
pub use record::{checksum_of, Record};
pub use registry::{LoadReport, ResourceRegistry, RESOURCE_EXTENSION};
pub use resolver::{FetchTarget, FieldResolver, Resolver, UniqueKey};
pub use resource::Resource;
