//! Job handler trait and execution context.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use lane_core::{Error, JobKind, QueuedJob, Result};

/// Context provided to job handlers.
pub struct JobContext {
    /// The claimed job being processed.
    pub job: QueuedJob,
}

impl JobContext {
    pub fn new(job: QueuedJob) -> Self {
        Self { job }
    }

    /// The raw job payload.
    pub fn payload(&self) -> Option<&JsonValue> {
        self.job.payload.as_ref()
    }

    /// Deserialize the payload into the handler's argument type.
    pub fn args<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self
            .payload()
            .ok_or_else(|| Error::Job(format!("job {} has no payload", self.job.id)))?;
        serde_json::from_value(payload.clone())
            .map_err(|e| Error::Job(format!("job {} payload is malformed: {e}", self.job.id)))
    }
}

/// Result of job execution.
///
/// There is no retry outcome: a failed job stays failed, and running the work
/// again means enqueueing a fresh job.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed; any results live in the entity tables the handler wrote.
    Success,
    /// Job failed with an error message.
    Failed(String),
}

/// Trait for job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job kind this handler processes.
    fn kind(&self) -> JobKind;

    /// Execute the job.
    async fn execute(&self, ctx: JobContext) -> JobResult;
}

/// No-op handler for testing.
pub struct NoOpHandler {
    kind: JobKind,
}

impl NoOpHandler {
    pub fn new(kind: JobKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl JobHandler for NoOpHandler {
    fn kind(&self) -> JobKind {
        self.kind
    }

    async fn execute(&self, _ctx: JobContext) -> JobResult {
        JobResult::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lane_core::RunStatus;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct SampleArgs {
        snapshot_id: String,
    }

    fn job_with_payload(payload: Option<JsonValue>) -> QueuedJob {
        QueuedJob {
            id: "job-1".into(),
            kind: JobKind::SchemaSnapshot,
            status: RunStatus::Running,
            payload,
            error: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[test]
    fn test_args_parses_payload() {
        let ctx = JobContext::new(job_with_payload(Some(json!({"snapshot_id": "s1"}))));
        let args: SampleArgs = ctx.args().unwrap();
        assert_eq!(args.snapshot_id, "s1");
    }

    #[test]
    fn test_args_on_missing_or_malformed_payload() {
        let ctx = JobContext::new(job_with_payload(None));
        assert!(ctx.args::<SampleArgs>().is_err());

        let ctx = JobContext::new(job_with_payload(Some(json!({"other": 1}))));
        assert!(ctx.args::<SampleArgs>().is_err());
    }

    #[tokio::test]
    async fn test_noop_handler() {
        let handler = NoOpHandler::new(JobKind::TrainingRun);
        assert_eq!(handler.kind(), JobKind::TrainingRun);

        let result = handler.execute(JobContext::new(job_with_payload(None))).await;
        assert!(matches!(result, JobResult::Success));
    }
}
