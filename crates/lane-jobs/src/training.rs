//! Handler that executes training run jobs.
//!
//! Model training itself is not wired up yet; the handler walks the run
//! through the full status machine and records placeholder metrics so the
//! surrounding orchestration is exercised end to end.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use lane_core::{JobKind, LogStreamManager, TrainingRepository};
use lane_db::Database;

use crate::handler::{JobContext, JobHandler, JobResult};

/// Payload of a training run job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJobArgs {
    pub run_id: String,
}

/// Executes a training run over a completed schema snapshot.
pub struct TrainingRunHandler {
    db: Database,
    logs: LogStreamManager,
}

impl TrainingRunHandler {
    pub fn new(db: Database, logs: LogStreamManager) -> Self {
        Self { db, logs }
    }

    /// Failure line follows the persisted transition; if the transition is
    /// rejected, nothing is emitted.
    async fn fail_run(&self, run_id: &str, message: String) -> JobResult {
        match self.db.training.fail(run_id, &message).await {
            Ok(()) => {
                self.logs
                    .emit(run_id, format!("training run failed: {message}"));
            }
            Err(e) => {
                error!(error = ?e, run_id, "Failed to record training failure");
            }
        }
        JobResult::Failed(message)
    }
}

#[async_trait]
impl JobHandler for TrainingRunHandler {
    fn kind(&self) -> JobKind {
        JobKind::TrainingRun
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let args: TrainingJobArgs = match ctx.args() {
            Ok(args) => args,
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        if let Err(e) = self.db.training.mark_running(&args.run_id).await {
            return JobResult::Failed(e.to_string());
        }
        self.logs.emit(&args.run_id, "training run started");

        let metrics = json!({ "placeholder_accuracy": 0.0 });
        if let Err(e) = self.db.training.complete(&args.run_id, &metrics).await {
            return self.fail_run(&args.run_id, e.to_string()).await;
        }
        self.logs.emit(&args.run_id, "training run completed");

        JobResult::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lane_core::{
        ConnectorRepository, CreateConnectorRequest, CreateTrainingRequest, QueuedJob, RunStatus,
        SnapshotRepository,
    };
    use lane_db::test_fixtures::memory_database;

    async fn seeded_run(db: &Database) -> String {
        let connector = db
            .connectors
            .create(CreateConnectorRequest {
                name: "src".into(),
                connector_type: "sqlite".into(),
                dsn: "sqlite:///tmp/source.db".into(),
            })
            .await
            .unwrap();
        let snapshot = db.snapshots.create(&connector.id).await.unwrap();
        db.training
            .create(CreateTrainingRequest {
                project_id: None,
                schema_snapshot_id: snapshot.id,
                config_path: "configs/run.yaml".into(),
            })
            .await
            .unwrap()
            .id
    }

    fn job_for(run_id: &str) -> JobContext {
        JobContext::new(QueuedJob {
            id: "job-1".into(),
            kind: JobKind::TrainingRun,
            status: RunStatus::Running,
            payload: Some(serde_json::json!({ "run_id": run_id })),
            error: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        })
    }

    #[tokio::test]
    async fn test_training_run_records_placeholder_metrics() {
        let db = memory_database().await;
        let logs = LogStreamManager::new(100);
        let run_id = seeded_run(&db).await;

        let handler = TrainingRunHandler::new(db.clone(), logs.clone());
        let result = handler.execute(job_for(&run_id)).await;
        assert!(matches!(result, JobResult::Success));

        let run = db.training.get(&run_id).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(
            run.metrics,
            Some(serde_json::json!({ "placeholder_accuracy": 0.0 }))
        );

        let mut sub = logs.subscribe(&run_id);
        assert_eq!(sub.recv().await.as_deref(), Some("training run started"));
        assert_eq!(sub.recv().await.as_deref(), Some("training run completed"));
    }

    #[tokio::test]
    async fn test_missing_run_fails_job() {
        let db = memory_database().await;
        let handler = TrainingRunHandler::new(db, LogStreamManager::new(100));

        let result = handler.execute(job_for("no-such-run")).await;
        assert!(matches!(result, JobResult::Failed(_)));
    }
}
