//! Connector repository backed by SQLite.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use lane_core::{
    new_id, Connector, ConnectorRepository, CreateConnectorRequest, Error, Result,
};

/// SQLite implementation of [`ConnectorRepository`].
#[derive(Clone)]
pub struct SqliteConnectorRepository {
    pool: SqlitePool,
}

impl SqliteConnectorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::sqlite::SqliteRow) -> Connector {
        Connector {
            id: row.get("id"),
            name: row.get("name"),
            connector_type: row.get("connector_type"),
            dsn: row.get("dsn"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl ConnectorRepository for SqliteConnectorRepository {
    async fn create(&self, req: CreateConnectorRequest) -> Result<Connector> {
        if req.name.trim().is_empty() {
            return Err(Error::InvalidInput("connector name must not be empty".into()));
        }
        if req.dsn.trim().is_empty() {
            return Err(Error::InvalidInput("connector dsn must not be empty".into()));
        }

        let connector = Connector {
            id: new_id(),
            name: req.name,
            connector_type: req.connector_type,
            dsn: req.dsn,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO connectors (id, name, connector_type, dsn, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&connector.id)
        .bind(&connector.name)
        .bind(&connector.connector_type)
        .bind(&connector.dsn)
        .bind(connector.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(connector)
    }

    async fn get(&self, connector_id: &str) -> Result<Connector> {
        let row = sqlx::query(
            "SELECT id, name, connector_type, dsn, created_at
             FROM connectors WHERE id = ?",
        )
        .bind(connector_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row)
            .ok_or_else(|| Error::NotFound(format!("connector {connector_id} not found")))
    }
}
