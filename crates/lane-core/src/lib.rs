//! # lane-core
//!
//! Core types, traits, and abstractions for querylane.
//!
//! This crate provides the foundational data structures shared by the other
//! querylane crates: the error taxonomy, the run status machine, the canonical
//! schema model produced by introspection, the per-entity log stream, and the
//! repository traits implemented by lane-db.

pub mod defaults;
pub mod error;
pub mod logstream;
pub mod models;
pub mod schema;
pub mod status;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use logstream::{LogStreamManager, LogSubscription};
pub use models::{
    Connector, CreateConnectorRequest, CreateTrainingRequest, JobKind, QueuedJob, SchemaSnapshot,
    TrainingRun,
};
pub use schema::{
    CanonicalSchema, ColumnDescriptor, DatabaseDescriptor, ForeignKeyGroup, ForeignKeyTarget,
    IndexDescriptor, Relationship, RelationshipEnd, TableDescriptor, TableKind,
};
pub use status::RunStatus;
pub use traits::{ConnectorRepository, JobQueue, SnapshotRepository, TrainingRepository};

/// Generate a new opaque entity id.
///
/// Entity ids are random UUIDs rendered as strings so that every collaborator
/// (store, queue, log stream, HTTP clients) can treat them as opaque tokens.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
