//! Schema snapshot repository backed by SQLite.
//!
//! Status transitions are guarded in SQL: the UPDATE matches on both id and
//! the expected current status, so a concurrent or out-of-order transition
//! affects zero rows instead of clobbering state.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use lane_core::{new_id, Error, Result, RunStatus, SchemaSnapshot, SnapshotRepository};

/// SQLite implementation of [`SnapshotRepository`].
#[derive(Clone)]
pub struct SqliteSnapshotRepository {
    pool: SqlitePool,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::sqlite::SqliteRow) -> Result<SchemaSnapshot> {
        let status: String = row.get("status");
        let status = RunStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("unknown snapshot status '{status}'")))?;
        Ok(SchemaSnapshot {
            id: row.get("id"),
            connector_id: row.get("connector_id"),
            status,
            artifact_json_path: row.get("artifact_json_path"),
            artifact_dbml_path: row.get("artifact_dbml_path"),
            error: row.get("error"),
            job_id: row.get("job_id"),
            created_at: row.get("created_at"),
        })
    }

    /// Zero rows matched a guarded transition: report whether the record is
    /// missing or in the wrong state.
    async fn transition_conflict(&self, snapshot_id: &str, wanted: RunStatus) -> Error {
        match self.get(snapshot_id).await {
            Ok(current) => Error::InvalidInput(format!(
                "snapshot {snapshot_id} is {} and cannot transition to {wanted}",
                current.status
            )),
            Err(err) => err,
        }
    }
}

#[async_trait]
impl SnapshotRepository for SqliteSnapshotRepository {
    async fn create(&self, connector_id: &str) -> Result<SchemaSnapshot> {
        let snapshot = SchemaSnapshot {
            id: new_id(),
            connector_id: connector_id.to_string(),
            status: RunStatus::Queued,
            artifact_json_path: None,
            artifact_dbml_path: None,
            error: None,
            job_id: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO schema_snapshots (id, connector_id, status, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&snapshot.id)
        .bind(&snapshot.connector_id)
        .bind(snapshot.status.as_str())
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(snapshot)
    }

    async fn get(&self, snapshot_id: &str) -> Result<SchemaSnapshot> {
        let row = sqlx::query(
            "SELECT id, connector_id, status, artifact_json_path, artifact_dbml_path,
                    error, job_id, created_at
             FROM schema_snapshots WHERE id = ?",
        )
        .bind(snapshot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Self::parse_row(row),
            None => Err(Error::NotFound(format!("snapshot {snapshot_id} not found"))),
        }
    }

    async fn set_job_id(&self, snapshot_id: &str, job_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE schema_snapshots SET job_id = ? WHERE id = ?")
            .bind(job_id)
            .bind(snapshot_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("snapshot {snapshot_id} not found")));
        }
        Ok(())
    }

    async fn mark_running(&self, snapshot_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE schema_snapshots SET status = 'running'
             WHERE id = ? AND status = 'queued'",
        )
        .bind(snapshot_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(snapshot_id, RunStatus::Running).await);
        }
        Ok(())
    }

    async fn complete(&self, snapshot_id: &str, json_path: &str, dbml_path: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE schema_snapshots
             SET status = 'completed', artifact_json_path = ?, artifact_dbml_path = ?
             WHERE id = ? AND status = 'running'",
        )
        .bind(json_path)
        .bind(dbml_path)
        .bind(snapshot_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(snapshot_id, RunStatus::Completed).await);
        }
        Ok(())
    }

    async fn fail(&self, snapshot_id: &str, error: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE schema_snapshots SET status = 'failed', error = ?
             WHERE id = ? AND status = 'running'",
        )
        .bind(error)
        .bind(snapshot_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(snapshot_id, RunStatus::Failed).await);
        }
        Ok(())
    }
}
