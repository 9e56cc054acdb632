//! # lane-schema
//!
//! Source database introspection and schema artifacts for querylane.
//!
//! This crate provides:
//! - Read-only access to SQLite source databases
//! - Catalog introspection into the canonical schema model
//! - DBML rendering
//! - The filesystem artifact store

pub mod artifact;
pub mod dbml;
pub mod introspect;
pub mod source;

pub use artifact::{ArtifactStore, SnapshotArtifacts};
pub use introspect::{introspect, introspect_with};
pub use source::{open_read_only, test_connection, validate_sqlite_dsn};
