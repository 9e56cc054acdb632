//! # lane-db
//!
//! SQLite metadata store for querylane.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for connectors, schema snapshots, and
//!   training runs
//! - The durable job queue the worker pool polls
//!
//! ## Example
//!
//! ```rust,ignore
//! use lane_db::Database;
//! use lane_core::CreateConnectorRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite://./data/lane.db").await?;
//!
//!     let connector = db.connectors.create(CreateConnectorRequest {
//!         name: "warehouse".to_string(),
//!         connector_type: "sqlite".to_string(),
//!         dsn: "sqlite:///data/warehouse.db".to_string(),
//!     }).await?;
//!
//!     println!("Registered connector: {}", connector.id);
//!     Ok(())
//! }
//! ```

pub mod connectors;
pub mod jobs;
pub mod pool;
pub mod snapshots;
pub mod training;

// Test fixtures are always compiled so integration tests in dependent crates
// can reuse them.
pub mod test_fixtures;

#[cfg(test)]
mod tests;

// Re-export core types
pub use lane_core::*;

pub use connectors::SqliteConnectorRepository;
pub use jobs::SqliteJobRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use snapshots::SqliteSnapshotRepository;
pub use training::SqliteTrainingRepository;

use sqlx::SqlitePool;

/// Main database handle bundling the pool and all repositories.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    pub connectors: SqliteConnectorRepository,
    pub snapshots: SqliteSnapshotRepository,
    pub training: SqliteTrainingRepository,
    pub jobs: SqliteJobRepository,
}

impl Database {
    /// Connect with default pool configuration and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Self::from_pool(pool).await
    }

    /// Connect with custom pool configuration and run pending migrations.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(database_url, config).await?;
        Self::from_pool(pool).await
    }

    /// Build the repository set over an existing pool, running migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Internal(format!("migration failed: {e}")))?;

        Ok(Self {
            connectors: SqliteConnectorRepository::new(pool.clone()),
            snapshots: SqliteSnapshotRepository::new(pool.clone()),
            training: SqliteTrainingRepository::new(pool.clone()),
            jobs: SqliteJobRepository::new(pool.clone()),
            pool,
        })
    }
}
