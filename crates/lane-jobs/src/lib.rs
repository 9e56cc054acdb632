//! # lane-jobs
//!
//! Background job orchestration for querylane.
//!
//! This crate provides:
//! - Job dispatch with a degraded-mode placeholder fallback
//! - A polling worker pool with concurrent execution and per-job timeouts
//! - Handlers for schema snapshot and training run jobs
//! - The run coordinator that ties requests to entities and jobs
//!
//! ## Example
//!
//! ```ignore
//! use lane_jobs::{JobWorker, WorkerConfig};
//! use lane_db::Database;
//!
//! let db = Database::connect("sqlite://./data/lane.db").await?;
//!
//! let worker = JobWorker::new(db, WorkerConfig::from_env());
//! let handle = worker.start();
//!
//! // Listen for events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod coordinator;
pub mod dispatch;
pub mod handler;
pub mod snapshot;
pub mod training;
pub mod worker;

// Re-export core types
pub use lane_core::*;

pub use coordinator::RunCoordinator;
pub use dispatch::JobDispatcher;
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler};
pub use snapshot::{SchemaSnapshotHandler, SnapshotJobArgs};
pub use training::{TrainingJobArgs, TrainingRunHandler};
pub use worker::{JobWorker, WorkerConfig, WorkerEvent, WorkerHandle};
