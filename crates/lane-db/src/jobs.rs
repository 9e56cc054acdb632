//! Durable job queue backed by SQLite.
//!
//! Claiming uses a single `UPDATE ... WHERE id = (SELECT ...)` statement so
//! two workers polling concurrently can never claim the same row; SQLite
//! serializes writers, and the status guard in the subquery makes the claim
//! atomic.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use lane_core::{new_id, Error, JobKind, JobQueue, QueuedJob, Result, RunStatus};
use serde_json::Value as JsonValue;

const JOB_COLUMNS: &str =
    "id, kind, status, payload, error, created_at, started_at, completed_at";

/// SQLite implementation of [`JobQueue`].
#[derive(Clone)]
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::sqlite::SqliteRow) -> Result<QueuedJob> {
        let kind: String = row.get("kind");
        let kind = JobKind::parse(&kind)
            .ok_or_else(|| Error::Internal(format!("unknown job kind '{kind}'")))?;
        let status: String = row.get("status");
        let status = RunStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("unknown job status '{status}'")))?;
        let payload: Option<String> = row.get("payload");
        let payload = payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(|e| Error::Serialization(format!("invalid job payload json: {e}")))?;
        Ok(QueuedJob {
            id: row.get("id"),
            kind,
            status,
            payload,
            error: row.get("error"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        })
    }
}

#[async_trait]
impl JobQueue for SqliteJobRepository {
    async fn enqueue(&self, kind: JobKind, payload: Option<JsonValue>) -> Result<String> {
        let job_id = new_id();
        let payload_text = payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Serialization(format!("job payload json: {e}")))?;

        sqlx::query(
            "INSERT INTO job_queue (id, kind, status, payload, created_at)
             VALUES (?, ?, 'queued', ?, ?)",
        )
        .bind(&job_id)
        .bind(kind.as_str())
        .bind(payload_text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(job_id)
    }

    async fn claim_next(&self) -> Result<Option<QueuedJob>> {
        let row = sqlx::query(&format!(
            "UPDATE job_queue
             SET status = 'running', started_at = ?
             WHERE id = (
                 SELECT id FROM job_queue
                 WHERE status = 'queued'
                 ORDER BY created_at ASC
                 LIMIT 1
             )
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row).transpose()
    }

    async fn complete(&self, job_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE job_queue SET status = 'completed', completed_at = ?
             WHERE id = ? AND status = 'running'",
        )
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::InvalidInput(format!(
                "job {job_id} is not running and cannot be completed"
            )));
        }
        Ok(())
    }

    async fn fail(&self, job_id: &str, error: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE job_queue SET status = 'failed', error = ?, completed_at = ?
             WHERE id = ? AND status = 'running'",
        )
        .bind(error)
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::InvalidInput(format!(
                "job {job_id} is not running and cannot be failed"
            )));
        }
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<QueuedJob>> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM job_queue WHERE id = ?"))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(Self::parse_row).transpose()
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM job_queue WHERE status = 'queued'")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(count.0)
    }
}
