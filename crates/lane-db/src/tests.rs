//! Repository tests over an in-memory database.

use lane_core::{
    ConnectorRepository, CreateConnectorRequest, CreateTrainingRequest, Error, JobKind, JobQueue,
    RunStatus, SnapshotRepository, TrainingRepository,
};
use serde_json::json;

use crate::test_fixtures::memory_database;

fn connector_request(name: &str) -> CreateConnectorRequest {
    CreateConnectorRequest {
        name: name.to_string(),
        connector_type: "sqlite".to_string(),
        dsn: "sqlite:///tmp/source.db".to_string(),
    }
}

#[tokio::test]
async fn test_connector_create_and_get() {
    let db = memory_database().await;

    let created = db.connectors.create(connector_request("warehouse")).await.unwrap();
    let fetched = db.connectors.get(&created.id).await.unwrap();

    assert_eq!(fetched.name, "warehouse");
    assert_eq!(fetched.connector_type, "sqlite");
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn test_connector_get_missing_is_not_found() {
    let db = memory_database().await;
    let err = db.connectors.get("no-such-id").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_connector_create_rejects_empty_name() {
    let db = memory_database().await;
    let err = db
        .connectors
        .create(CreateConnectorRequest {
            name: "  ".to_string(),
            connector_type: "sqlite".to_string(),
            dsn: "sqlite:///tmp/source.db".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_snapshot_lifecycle_success() {
    let db = memory_database().await;
    let connector = db.connectors.create(connector_request("c")).await.unwrap();

    let snapshot = db.snapshots.create(&connector.id).await.unwrap();
    assert_eq!(snapshot.status, RunStatus::Queued);
    assert!(snapshot.artifact_json_path.is_none());

    db.snapshots.set_job_id(&snapshot.id, "job-1").await.unwrap();
    db.snapshots.mark_running(&snapshot.id).await.unwrap();
    db.snapshots
        .complete(&snapshot.id, "schemas/s.json", "schemas/s.dbml")
        .await
        .unwrap();

    let done = db.snapshots.get(&snapshot.id).await.unwrap();
    assert_eq!(done.status, RunStatus::Completed);
    assert_eq!(done.artifact_json_path.as_deref(), Some("schemas/s.json"));
    assert_eq!(done.artifact_dbml_path.as_deref(), Some("schemas/s.dbml"));
    assert_eq!(done.job_id.as_deref(), Some("job-1"));
    assert!(done.error.is_none());
}

#[tokio::test]
async fn test_snapshot_failure_records_error() {
    let db = memory_database().await;
    let connector = db.connectors.create(connector_request("c")).await.unwrap();
    let snapshot = db.snapshots.create(&connector.id).await.unwrap();

    db.snapshots.mark_running(&snapshot.id).await.unwrap();
    db.snapshots.fail(&snapshot.id, "introspection failed").await.unwrap();

    let failed = db.snapshots.get(&snapshot.id).await.unwrap();
    assert_eq!(failed.status, RunStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("introspection failed"));
    assert!(failed.artifact_json_path.is_none());
}

#[tokio::test]
async fn test_snapshot_illegal_transition_rejected() {
    let db = memory_database().await;
    let connector = db.connectors.create(connector_request("c")).await.unwrap();
    let snapshot = db.snapshots.create(&connector.id).await.unwrap();

    // Completing without running first is rejected and state is untouched.
    let err = db
        .snapshots
        .complete(&snapshot.id, "a.json", "a.dbml")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let unchanged = db.snapshots.get(&snapshot.id).await.unwrap();
    assert_eq!(unchanged.status, RunStatus::Queued);

    // Terminal states never transition again.
    db.snapshots.mark_running(&snapshot.id).await.unwrap();
    db.snapshots.fail(&snapshot.id, "boom").await.unwrap();
    let err = db.snapshots.mark_running(&snapshot.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_snapshot_transition_on_missing_id_is_not_found() {
    let db = memory_database().await;
    let err = db.snapshots.mark_running("ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_training_lifecycle_with_metrics() {
    let db = memory_database().await;
    let connector = db.connectors.create(connector_request("c")).await.unwrap();
    let snapshot = db.snapshots.create(&connector.id).await.unwrap();

    let run = db
        .training
        .create(CreateTrainingRequest {
            project_id: Some("proj-1".to_string()),
            schema_snapshot_id: snapshot.id.clone(),
            config_path: "configs/run.yaml".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Queued);

    db.training.mark_running(&run.id).await.unwrap();
    db.training
        .complete(&run.id, &json!({"placeholder_accuracy": 0.0}))
        .await
        .unwrap();

    let done = db.training.get(&run.id).await.unwrap();
    assert_eq!(done.status, RunStatus::Completed);
    assert_eq!(done.metrics, Some(json!({"placeholder_accuracy": 0.0})));
    assert_eq!(done.project_id.as_deref(), Some("proj-1"));
}

#[tokio::test]
async fn test_job_queue_claim_order_and_states() {
    let db = memory_database().await;

    let first = db.jobs.enqueue(JobKind::SchemaSnapshot, None).await.unwrap();
    let second = db
        .jobs
        .enqueue(JobKind::TrainingRun, Some(json!({"run_id": "r1"})))
        .await
        .unwrap();
    assert_eq!(db.jobs.pending_count().await.unwrap(), 2);

    // Oldest queued job is claimed first and moves to running.
    let claimed = db.jobs.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, first);
    assert_eq!(claimed.status, RunStatus::Running);
    assert!(claimed.started_at.is_some());
    assert_eq!(db.jobs.pending_count().await.unwrap(), 1);

    let claimed2 = db.jobs.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed2.id, second);
    assert_eq!(claimed2.payload, Some(json!({"run_id": "r1"})));

    // Queue drained.
    assert!(db.jobs.claim_next().await.unwrap().is_none());

    db.jobs.complete(&first).await.unwrap();
    db.jobs.fail(&second, "handler error").await.unwrap();

    let done = db.jobs.get(&first).await.unwrap().unwrap();
    assert_eq!(done.status, RunStatus::Completed);
    assert!(done.completed_at.is_some());

    let failed = db.jobs.get(&second).await.unwrap().unwrap();
    assert_eq!(failed.status, RunStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("handler error"));
}

#[tokio::test]
async fn test_job_complete_requires_running() {
    let db = memory_database().await;
    let job_id = db.jobs.enqueue(JobKind::SchemaSnapshot, None).await.unwrap();

    // Still queued, not claimed.
    let err = db.jobs.complete(&job_id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}
