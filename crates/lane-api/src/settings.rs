//! Server configuration from environment variables.

use std::path::PathBuf;

use lane_core::defaults;

/// Runtime settings for the API server.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `DATABASE_URL` | `sqlite://./data/lane.db` | Metadata store location |
/// | `HOST` | `0.0.0.0` | Bind address |
/// | `PORT` | `8000` | Bind port |
/// | `ARTIFACT_DIR` | `./data/artifacts` | Root for schema artifacts |
/// | `LOG_RETENTION` | `500` | Log lines retained per run |
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub artifact_dir: PathBuf,
    pub log_retention: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/lane.db".to_string());
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);
        let artifact_dir = std::env::var("ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/artifacts"));
        let log_retention = std::env::var("LOG_RETENTION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::LOG_RETENTION);

        Self {
            database_url,
            host,
            port,
            artifact_dir,
            log_retention,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
