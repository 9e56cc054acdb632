//! Run coordination: validate, create the entity, dispatch, announce.

use serde_json::json;
use tracing::info;

use lane_core::{
    ConnectorRepository, CreateTrainingRequest, Error, LogStreamManager, Result, RunStatus,
    SchemaSnapshot, SnapshotRepository, TrainingRepository, TrainingRun,
};
use lane_db::Database;
use lane_schema::validate_sqlite_dsn;

use crate::dispatch::JobDispatcher;
use crate::snapshot::SnapshotJobArgs;
use crate::training::TrainingJobArgs;

/// Front door for starting background runs.
///
/// Each start call follows the same shape: validate the request, create the
/// entity in queued state, dispatch the job, record the job id, and announce
/// the run on its log stream. The entity is returned immediately; the worker
/// drives it to a terminal state.
#[derive(Clone)]
pub struct RunCoordinator {
    db: Database,
    dispatcher: JobDispatcher,
    logs: LogStreamManager,
}

impl RunCoordinator {
    pub fn new(db: Database, dispatcher: JobDispatcher, logs: LogStreamManager) -> Self {
        Self {
            db,
            dispatcher,
            logs,
        }
    }

    /// Start a schema snapshot run for a connector.
    pub async fn start_snapshot(&self, connector_id: &str) -> Result<SchemaSnapshot> {
        let connector = self.db.connectors.get(connector_id).await?;
        validate_sqlite_dsn(&connector.dsn)?;

        let mut snapshot = self.db.snapshots.create(connector_id).await?;

        let args = SnapshotJobArgs {
            snapshot_id: snapshot.id.clone(),
            connector_id: connector_id.to_string(),
        };
        let job_id = self
            .dispatcher
            .submit(lane_core::JobKind::SchemaSnapshot, Some(json!(args)))
            .await;
        self.db.snapshots.set_job_id(&snapshot.id, &job_id).await?;
        snapshot.job_id = Some(job_id.clone());

        self.logs.emit(&snapshot.id, "schema snapshot enqueued");
        info!(
            subsystem = "jobs",
            component = "coordinator",
            snapshot_id = %snapshot.id,
            %job_id,
            "Schema snapshot run started"
        );

        Ok(snapshot)
    }

    /// Start a training run over a completed schema snapshot.
    pub async fn start_training(&self, req: CreateTrainingRequest) -> Result<TrainingRun> {
        let snapshot = self.db.snapshots.get(&req.schema_snapshot_id).await?;
        if snapshot.status != RunStatus::Completed {
            return Err(Error::InvalidInput(format!(
                "schema snapshot {} is {}; training requires a completed snapshot",
                snapshot.id, snapshot.status
            )));
        }

        let mut run = self.db.training.create(req).await?;

        let args = TrainingJobArgs {
            run_id: run.id.clone(),
        };
        let job_id = self
            .dispatcher
            .submit(lane_core::JobKind::TrainingRun, Some(json!(args)))
            .await;
        self.db.training.set_job_id(&run.id, &job_id).await?;
        run.job_id = Some(job_id.clone());

        self.logs.emit(&run.id, "training run enqueued");
        info!(
            subsystem = "jobs",
            component = "coordinator",
            run_id = %run.id,
            %job_id,
            "Training run started"
        );

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lane_core::{ConnectorRepository, CreateConnectorRequest, JobQueue, SnapshotRepository};
    use lane_db::test_fixtures::memory_database;

    async fn coordinator_over(db: &Database) -> RunCoordinator {
        RunCoordinator::new(
            db.clone(),
            JobDispatcher::new(Arc::new(db.jobs.clone())),
            LogStreamManager::new(100),
        )
    }

    async fn sqlite_connector(db: &Database) -> String {
        db.connectors
            .create(CreateConnectorRequest {
                name: "src".into(),
                connector_type: "sqlite".into(),
                dsn: "sqlite:///tmp/source.db".into(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_start_snapshot_enqueues_job() {
        let db = memory_database().await;
        let coordinator = coordinator_over(&db).await;
        let connector_id = sqlite_connector(&db).await;

        let snapshot = coordinator.start_snapshot(&connector_id).await.unwrap();
        assert_eq!(snapshot.status, RunStatus::Queued);

        let job_id = snapshot.job_id.expect("job id recorded");
        let job = db.jobs.get(&job_id).await.unwrap().expect("job enqueued");
        assert_eq!(
            job.payload.unwrap()["snapshot_id"],
            serde_json::json!(snapshot.id)
        );

        // The stored entity carries the same job id.
        let stored = db.snapshots.get(&snapshot.id).await.unwrap();
        assert_eq!(stored.job_id.as_deref(), Some(job_id.as_str()));
    }

    #[tokio::test]
    async fn test_start_snapshot_rejects_unsupported_dsn() {
        let db = memory_database().await;
        let coordinator = coordinator_over(&db).await;
        let connector_id = db
            .connectors
            .create(CreateConnectorRequest {
                name: "pg".into(),
                connector_type: "postgres".into(),
                dsn: "postgres://host/db".into(),
            })
            .await
            .unwrap()
            .id;

        let err = coordinator.start_snapshot(&connector_id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(db.jobs.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_start_snapshot_unknown_connector() {
        let db = memory_database().await;
        let coordinator = coordinator_over(&db).await;
        let err = coordinator.start_snapshot("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_start_training_requires_completed_snapshot() {
        let db = memory_database().await;
        let coordinator = coordinator_over(&db).await;
        let connector_id = sqlite_connector(&db).await;
        let snapshot = db.snapshots.create(&connector_id).await.unwrap();

        // Still queued: rejected.
        let err = coordinator
            .start_training(CreateTrainingRequest {
                project_id: None,
                schema_snapshot_id: snapshot.id.clone(),
                config_path: "configs/run.yaml".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // Completed: accepted and dispatched.
        db.snapshots.mark_running(&snapshot.id).await.unwrap();
        db.snapshots
            .complete(&snapshot.id, "schemas/s.json", "schemas/s.dbml")
            .await
            .unwrap();

        let run = coordinator
            .start_training(CreateTrainingRequest {
                project_id: Some("proj".into()),
                schema_snapshot_id: snapshot.id,
                config_path: "configs/run.yaml".into(),
            })
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Queued);
        assert!(run.job_id.is_some());
        assert_eq!(db.jobs.pending_count().await.unwrap(), 1);
    }
}
