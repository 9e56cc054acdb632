//! Read-only access to source databases.
//!
//! Introspection never mutates the source: connections are opened with the
//! SQLite read-only flag and only ever run catalog queries.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;

use lane_core::{Error, Result};

/// Validate that a DSN names a SQLite database we can introspect.
///
/// Only the `sqlite:` scheme is supported; anything else is rejected up
/// front so the caller gets a clear validation error instead of a driver
/// failure mid-run.
pub fn validate_sqlite_dsn(dsn: &str) -> Result<()> {
    let trimmed = dsn.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("dsn must not be empty".into()));
    }
    if !trimmed.starts_with("sqlite:") {
        return Err(Error::InvalidInput(format!(
            "unsupported dsn scheme; only sqlite sources can be introspected (got '{}')",
            dsn.split(':').next().unwrap_or(dsn)
        )));
    }
    Ok(())
}

/// Open a read-only connection to a source database.
pub async fn open_read_only(dsn: &str) -> Result<SqliteConnection> {
    validate_sqlite_dsn(dsn)?;
    let options = SqliteConnectOptions::from_str(dsn)
        .map_err(|e| Error::Introspection(format!("invalid sqlite dsn: {e}")))?
        .read_only(true);
    options
        .connect()
        .await
        .map_err(|e| Error::Introspection(format!("cannot open source database: {e}")))
}

/// Probe a source database: open it and run a trivial query.
pub async fn test_connection(dsn: &str) -> Result<()> {
    let mut conn = open_read_only(dsn).await?;
    sqlx::query("SELECT 1")
        .fetch_one(&mut conn)
        .await
        .map_err(|e| Error::Introspection(format!("connection probe failed: {e}")))?;
    Ok(())
}
