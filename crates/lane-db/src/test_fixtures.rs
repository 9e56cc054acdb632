//! Test fixtures for database tests.
//!
//! An in-memory SQLite database only lives as long as its connection, so the
//! fixture pool is pinned to a single connection that is never released.

use std::time::Duration;

use crate::{Database, PoolConfig};

/// Open a fresh in-memory database with migrations applied.
///
/// Each call returns an isolated database; nothing is shared between tests.
pub async fn memory_database() -> Database {
    let config = PoolConfig::new()
        .max_connections(1)
        .connect_timeout(Duration::from_secs(5));
    crate::Database::connect_with_config("sqlite::memory:", config)
        .await
        .expect("in-memory database should open")
}
