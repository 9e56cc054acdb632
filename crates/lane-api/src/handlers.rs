//! Route handlers.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::json;

use lane_core::{
    Connector, ConnectorRepository, CreateConnectorRequest, CreateTrainingRequest,
    SchemaSnapshot, SnapshotRepository, TrainingRepository, TrainingRun,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Connector as exposed over HTTP; the DSN is masked.
#[derive(Debug, Serialize)]
pub struct ConnectorResponse {
    pub id: String,
    pub name: String,
    pub connector_type: String,
    pub dsn: String,
    pub created_at: DateTime<Utc>,
}

impl From<Connector> for ConnectorResponse {
    fn from(connector: Connector) -> Self {
        Self {
            dsn: connector.masked_dsn(),
            id: connector.id,
            name: connector.name,
            connector_type: connector.connector_type,
            created_at: connector.created_at,
        }
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn create_connector(
    State(state): State<AppState>,
    Json(req): Json<CreateConnectorRequest>,
) -> Result<(StatusCode, Json<ConnectorResponse>), ApiError> {
    let connector = state.db.connectors.create(req).await?;
    Ok((StatusCode::CREATED, Json(connector.into())))
}

pub async fn get_connector(
    State(state): State<AppState>,
    Path(connector_id): Path<String>,
) -> Result<Json<ConnectorResponse>, ApiError> {
    let connector = state.db.connectors.get(&connector_id).await?;
    Ok(Json(connector.into()))
}

/// Probe a connector's source database.
pub async fn test_connector(
    State(state): State<AppState>,
    Path(connector_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let connector = state.db.connectors.get(&connector_id).await?;
    lane_schema::test_connection(&connector.dsn).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Start a schema snapshot run; returns 202 with the queued entity.
pub async fn start_snapshot(
    State(state): State<AppState>,
    Path(connector_id): Path<String>,
) -> Result<(StatusCode, Json<SchemaSnapshot>), ApiError> {
    let snapshot = state.coordinator.start_snapshot(&connector_id).await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(snapshot_id): Path<String>,
) -> Result<Json<SchemaSnapshot>, ApiError> {
    let snapshot = state.db.snapshots.get(&snapshot_id).await?;
    Ok(Json(snapshot))
}

/// Start a training run; returns 202 with the queued entity.
pub async fn start_training(
    State(state): State<AppState>,
    Json(req): Json<CreateTrainingRequest>,
) -> Result<(StatusCode, Json<TrainingRun>), ApiError> {
    let run = state.coordinator.start_training(req).await?;
    Ok((StatusCode::ACCEPTED, Json(run)))
}

pub async fn get_training(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<TrainingRun>, ApiError> {
    let run = state.db.training.get(&run_id).await?;
    Ok(Json(run))
}

/// SSE stream of a run's log lines: buffered history first, then live.
pub async fn stream_run_logs(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.logs.subscribe(&run_id);
    let stream = subscription.map(|line| Ok::<_, Infallible>(Event::default().data(line)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("keepalive"),
    )
}
