//! # lane-api
//!
//! HTTP API server for querylane: connector registration, schema snapshot
//! and training runs, and live run log streams over SSE.

pub mod error;
pub mod handlers;
pub mod settings;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use settings::Settings;
pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/connectors", post(handlers::create_connector))
        .route("/api/v1/connectors/:id", get(handlers::get_connector))
        .route("/api/v1/connectors/:id/test", post(handlers::test_connector))
        .route(
            "/api/v1/connectors/:id/schema/snapshot",
            post(handlers::start_snapshot),
        )
        .route("/api/v1/schema-snapshots/:id", get(handlers::get_snapshot))
        .route("/api/v1/train", post(handlers::start_training))
        .route("/api/v1/train/:id", get(handlers::get_training))
        .route("/api/v1/runs/:id/logs/stream", get(handlers::stream_run_logs))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
