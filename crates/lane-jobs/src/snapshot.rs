//! Handler that executes schema snapshot jobs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::error;

use lane_core::{ConnectorRepository, JobKind, LogStreamManager, SnapshotRepository};
use lane_db::Database;
use lane_schema::{introspect, ArtifactStore};

use crate::handler::{JobContext, JobHandler, JobResult};

/// Payload of a schema snapshot job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotJobArgs {
    pub snapshot_id: String,
    pub connector_id: String,
}

/// Introspects a connector's database and persists the schema artifacts.
pub struct SchemaSnapshotHandler {
    db: Database,
    logs: LogStreamManager,
    artifacts: ArtifactStore,
}

impl SchemaSnapshotHandler {
    pub fn new(db: Database, logs: LogStreamManager, artifacts: ArtifactStore) -> Self {
        Self { db, logs, artifacts }
    }

    /// Record the failure on the snapshot, then surface it on the log stream.
    ///
    /// The status transition lands before the log line so a reader reacting
    /// to the line always observes the terminal state. If the transition is
    /// rejected (the snapshot never reached `running`), no line is emitted.
    async fn fail_snapshot(&self, snapshot_id: &str, message: String) -> JobResult {
        match self.db.snapshots.fail(snapshot_id, &message).await {
            Ok(()) => {
                self.logs
                    .emit(snapshot_id, format!("schema snapshot failed: {message}"));
            }
            Err(e) => {
                error!(error = ?e, snapshot_id, "Failed to record snapshot failure");
            }
        }
        JobResult::Failed(message)
    }
}

#[async_trait]
impl JobHandler for SchemaSnapshotHandler {
    fn kind(&self) -> JobKind {
        JobKind::SchemaSnapshot
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let args: SnapshotJobArgs = match ctx.args() {
            Ok(args) => args,
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        let connector = match self.db.connectors.get(&args.connector_id).await {
            Ok(connector) => connector,
            Err(e) => return self.fail_snapshot(&args.snapshot_id, e.to_string()).await,
        };

        if let Err(e) = self.db.snapshots.mark_running(&args.snapshot_id).await {
            return JobResult::Failed(e.to_string());
        }
        self.logs.emit(&args.snapshot_id, "schema snapshot started");

        let schema = match introspect(&connector.dsn).await {
            Ok(schema) => schema,
            Err(e) => return self.fail_snapshot(&args.snapshot_id, e.to_string()).await,
        };
        self.logs.emit(
            &args.snapshot_id,
            format!(
                "introspected {} tables, {} relationships",
                schema.tables.len(),
                schema.relationships.len()
            ),
        );

        let written = match self.artifacts.write_snapshot(&args.snapshot_id, &schema).await {
            Ok(written) => written,
            Err(e) => return self.fail_snapshot(&args.snapshot_id, e.to_string()).await,
        };

        if let Err(e) = self
            .db
            .snapshots
            .complete(&args.snapshot_id, &written.json_path, &written.dbml_path)
            .await
        {
            return self.fail_snapshot(&args.snapshot_id, e.to_string()).await;
        }
        self.logs.emit(&args.snapshot_id, "schema snapshot completed");

        JobResult::Success
    }
}
