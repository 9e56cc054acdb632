//! Shared application state.

use lane_core::LogStreamManager;
use lane_db::Database;
use lane_jobs::RunCoordinator;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub logs: LogStreamManager,
    pub coordinator: RunCoordinator,
}
