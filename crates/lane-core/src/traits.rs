//! Repository and queue traits implemented by lane-db.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::{
    Connector, CreateConnectorRequest, CreateTrainingRequest, JobKind, QueuedJob, SchemaSnapshot,
    TrainingRun,
};

/// Durable store for connector records.
#[async_trait]
pub trait ConnectorRepository: Send + Sync {
    async fn create(&self, req: CreateConnectorRequest) -> Result<Connector>;

    /// Fetch a connector; `Error::NotFound` if the id does not exist.
    async fn get(&self, connector_id: &str) -> Result<Connector>;
}

/// Durable store for schema snapshot entities.
///
/// Every mutation is a single atomic per-record update; status transitions
/// are guarded so an illegal walk (e.g. completing a queued snapshot) is
/// rejected rather than silently applied.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Create a snapshot in `queued` state with a fresh id.
    async fn create(&self, connector_id: &str) -> Result<SchemaSnapshot>;

    async fn get(&self, snapshot_id: &str) -> Result<SchemaSnapshot>;

    /// Record the dispatched job id (assigned once).
    async fn set_job_id(&self, snapshot_id: &str, job_id: &str) -> Result<()>;

    /// Transition `queued -> running`.
    async fn mark_running(&self, snapshot_id: &str) -> Result<()>;

    /// Transition `running -> completed` and record artifact paths.
    async fn complete(&self, snapshot_id: &str, json_path: &str, dbml_path: &str) -> Result<()>;

    /// Transition `running -> failed` and record the error detail.
    async fn fail(&self, snapshot_id: &str, error: &str) -> Result<()>;
}

/// Durable store for training run entities.
#[async_trait]
pub trait TrainingRepository: Send + Sync {
    async fn create(&self, req: CreateTrainingRequest) -> Result<TrainingRun>;

    async fn get(&self, run_id: &str) -> Result<TrainingRun>;

    async fn set_job_id(&self, run_id: &str, job_id: &str) -> Result<()>;

    async fn mark_running(&self, run_id: &str) -> Result<()>;

    /// Transition `running -> completed` and record metrics.
    async fn complete(&self, run_id: &str, metrics: &JsonValue) -> Result<()>;

    async fn fail(&self, run_id: &str, error: &str) -> Result<()>;
}

/// The worker pool's backing queue.
///
/// The dispatcher only needs `enqueue`; the worker claims, completes, and
/// fails jobs. Claiming is atomic: two workers never claim the same job.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job and return the queue-assigned id.
    async fn enqueue(&self, kind: JobKind, payload: Option<JsonValue>) -> Result<String>;

    /// Atomically claim the oldest queued job, moving it to `running`.
    async fn claim_next(&self) -> Result<Option<QueuedJob>>;

    /// Mark a running job completed.
    async fn complete(&self, job_id: &str) -> Result<()>;

    /// Mark a running job failed with an error detail. There is no retry:
    /// a failed job stays failed and re-running requires a fresh enqueue.
    async fn fail(&self, job_id: &str, error: &str) -> Result<()>;

    async fn get(&self, job_id: &str) -> Result<Option<QueuedJob>>;

    async fn pending_count(&self) -> Result<i64>;
}
