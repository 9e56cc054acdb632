//! Training run repository backed by SQLite.
//!
//! Same guarded-transition pattern as the snapshot repository; metrics are
//! stored as a JSON text column.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use lane_core::{
    new_id, CreateTrainingRequest, Error, Result, RunStatus, TrainingRepository, TrainingRun,
};
use serde_json::Value as JsonValue;

/// SQLite implementation of [`TrainingRepository`].
#[derive(Clone)]
pub struct SqliteTrainingRepository {
    pool: SqlitePool,
}

impl SqliteTrainingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::sqlite::SqliteRow) -> Result<TrainingRun> {
        let status: String = row.get("status");
        let status = RunStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("unknown training status '{status}'")))?;
        let metrics: Option<String> = row.get("metrics");
        let metrics = metrics
            .map(|m| serde_json::from_str(&m))
            .transpose()
            .map_err(|e| Error::Serialization(format!("invalid metrics json: {e}")))?;
        Ok(TrainingRun {
            id: row.get("id"),
            project_id: row.get("project_id"),
            schema_snapshot_id: row.get("schema_snapshot_id"),
            config_path: row.get("config_path"),
            status,
            metrics,
            error: row.get("error"),
            job_id: row.get("job_id"),
            created_at: row.get("created_at"),
        })
    }

    async fn transition_conflict(&self, run_id: &str, wanted: RunStatus) -> Error {
        match self.get(run_id).await {
            Ok(current) => Error::InvalidInput(format!(
                "training run {run_id} is {} and cannot transition to {wanted}",
                current.status
            )),
            Err(err) => err,
        }
    }
}

#[async_trait]
impl TrainingRepository for SqliteTrainingRepository {
    async fn create(&self, req: CreateTrainingRequest) -> Result<TrainingRun> {
        if req.config_path.trim().is_empty() {
            return Err(Error::InvalidInput("config_path must not be empty".into()));
        }

        let run = TrainingRun {
            id: new_id(),
            project_id: req.project_id,
            schema_snapshot_id: req.schema_snapshot_id,
            config_path: req.config_path,
            status: RunStatus::Queued,
            metrics: None,
            error: None,
            job_id: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO training_runs (id, project_id, schema_snapshot_id, config_path,
                                        status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&run.id)
        .bind(&run.project_id)
        .bind(&run.schema_snapshot_id)
        .bind(&run.config_path)
        .bind(run.status.as_str())
        .bind(run.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(run)
    }

    async fn get(&self, run_id: &str) -> Result<TrainingRun> {
        let row = sqlx::query(
            "SELECT id, project_id, schema_snapshot_id, config_path, status, metrics,
                    error, job_id, created_at
             FROM training_runs WHERE id = ?",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Self::parse_row(row),
            None => Err(Error::NotFound(format!("training run {run_id} not found"))),
        }
    }

    async fn set_job_id(&self, run_id: &str, job_id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE training_runs SET job_id = ? WHERE id = ?")
            .bind(job_id)
            .bind(run_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("training run {run_id} not found")));
        }
        Ok(())
    }

    async fn mark_running(&self, run_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE training_runs SET status = 'running'
             WHERE id = ? AND status = 'queued'",
        )
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(run_id, RunStatus::Running).await);
        }
        Ok(())
    }

    async fn complete(&self, run_id: &str, metrics: &JsonValue) -> Result<()> {
        let metrics_text = serde_json::to_string(metrics)
            .map_err(|e| Error::Serialization(format!("metrics json: {e}")))?;

        let result = sqlx::query(
            "UPDATE training_runs SET status = 'completed', metrics = ?
             WHERE id = ? AND status = 'running'",
        )
        .bind(metrics_text)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(run_id, RunStatus::Completed).await);
        }
        Ok(())
    }

    async fn fail(&self, run_id: &str, error: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE training_runs SET status = 'failed', error = ?
             WHERE id = ? AND status = 'running'",
        )
        .bind(error)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(self.transition_conflict(run_id, RunStatus::Failed).await);
        }
        Ok(())
    }
}
