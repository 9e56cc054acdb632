//! Job dispatch with degraded-mode fallback.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use uuid::Uuid;

use lane_core::{defaults, JobKind, JobQueue};

/// Submits jobs to the queue, degrading gracefully when the queue is
/// unavailable.
///
/// Dispatch never fails the caller's request: if enqueueing errors, a
/// placeholder id with the `local-` prefix is returned so the entity still
/// records that dispatch was attempted. No job exists behind a placeholder
/// id, so the entity stays queued until a fresh request re-dispatches it.
#[derive(Clone)]
pub struct JobDispatcher {
    queue: Arc<dyn JobQueue>,
}

impl JobDispatcher {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    /// Submit a job and return its id, real or placeholder.
    pub async fn submit(&self, kind: JobKind, payload: Option<JsonValue>) -> String {
        match self.queue.enqueue(kind, payload).await {
            Ok(job_id) => {
                debug!(
                    subsystem = "jobs",
                    component = "dispatcher",
                    %kind,
                    %job_id,
                    "Job enqueued"
                );
                job_id
            }
            Err(error) => {
                let placeholder = format!("{}{}", defaults::LOCAL_JOB_ID_PREFIX, Uuid::new_v4());
                warn!(
                    subsystem = "jobs",
                    component = "dispatcher",
                    %kind,
                    %error,
                    placeholder_id = %placeholder,
                    "Job queue unavailable, recording placeholder id"
                );
                placeholder
            }
        }
    }
}
