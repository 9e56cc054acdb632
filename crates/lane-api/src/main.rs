//! lane-api - HTTP API server for querylane

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lane_api::{router, AppState, Settings};
use lane_core::LogStreamManager;
use lane_db::Database;
use lane_jobs::{
    JobDispatcher, JobWorker, RunCoordinator, SchemaSnapshotHandler, TrainingRunHandler,
    WorkerConfig,
};
use lane_schema::ArtifactStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lane_api=debug,lane_jobs=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();

    info!("Connecting to database...");
    let db = Database::connect(&settings.database_url).await?;
    info!("Database connected");

    let logs = LogStreamManager::new(settings.log_retention);
    let artifacts = ArtifactStore::new(settings.artifact_dir.clone());
    let dispatcher = JobDispatcher::new(Arc::new(db.jobs.clone()));
    let coordinator = RunCoordinator::new(db.clone(), dispatcher, logs.clone());

    // Start the worker pool with both run handlers.
    let worker = JobWorker::new(db.clone(), WorkerConfig::from_env());
    worker
        .register_handler(SchemaSnapshotHandler::new(
            db.clone(),
            logs.clone(),
            artifacts,
        ))
        .await;
    worker
        .register_handler(TrainingRunHandler::new(db.clone(), logs.clone()))
        .await;
    let _worker_handle = worker.start();

    let app = router(AppState {
        db,
        logs,
        coordinator,
    });

    let addr = settings.bind_addr();
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
