//! Durable schema artifacts.
//!
//! Each completed introspection run produces two files under the store root:
//! a pretty-printed JSON document of the canonical model and a DBML
//! rendering, both named by snapshot id.

use std::path::{Path, PathBuf};

use tracing::info;

use lane_core::{defaults, CanonicalSchema, Error, Result};

use crate::dbml;

/// Paths of the files written for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifacts {
    pub json_path: String,
    pub dbml_path: String,
}

/// Filesystem store for schema artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory all schema artifacts live under.
    pub fn schema_dir(&self) -> PathBuf {
        self.root.join(defaults::SCHEMA_ARTIFACT_DIR)
    }

    /// Write both artifact formats for a snapshot and return their paths.
    ///
    /// A failure names the format that could not be written; a format already
    /// written by then stays on disk.
    pub async fn write_snapshot(
        &self,
        snapshot_id: &str,
        schema: &CanonicalSchema,
    ) -> Result<SnapshotArtifacts> {
        let dir = self.schema_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Artifact(format!("creating artifact directory: {e}")))?;

        let json_path = dir.join(format!("{snapshot_id}.json"));
        let json_bytes = serde_json::to_vec_pretty(schema)
            .map_err(|e| Error::Artifact(format!("serializing schema json: {e}")))?;
        write_file(&json_path, &json_bytes, "json").await?;

        let dbml_path = dir.join(format!("{snapshot_id}.dbml"));
        write_file(&dbml_path, dbml::render(schema).as_bytes(), "dbml").await?;

        info!(
            subsystem = "schema",
            component = "artifacts",
            snapshot_id,
            tables = schema.tables.len(),
            "Schema artifacts written"
        );

        Ok(SnapshotArtifacts {
            json_path: json_path.to_string_lossy().into_owned(),
            dbml_path: dbml_path.to_string_lossy().into_owned(),
        })
    }
}

async fn write_file(path: &Path, bytes: &[u8], format: &str) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| Error::Artifact(format!("writing {format} artifact: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lane_core::{DatabaseDescriptor, TableDescriptor, TableKind};

    fn schema_with_table(name: &str) -> CanonicalSchema {
        CanonicalSchema {
            generated_at: Utc::now(),
            database: DatabaseDescriptor {
                driver: "sqlite".into(),
                dialect: "sqlite".into(),
            },
            tables: vec![TableDescriptor {
                name: name.into(),
                kind: TableKind::Table,
                columns: vec![],
                primary_key: vec![],
                foreign_keys: vec![],
                indexes: vec![],
            }],
            relationships: vec![],
        }
    }

    #[tokio::test]
    async fn test_write_snapshot_produces_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let artifacts = store
            .write_snapshot("snap-1", &schema_with_table("authors"))
            .await
            .unwrap();

        let json = tokio::fs::read_to_string(&artifacts.json_path).await.unwrap();
        let parsed: CanonicalSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tables[0].name, "authors");

        let dbml = tokio::fs::read_to_string(&artifacts.dbml_path).await.unwrap();
        assert!(dbml.contains("Table \"authors\""));

        // Files land under the schemas subdirectory, named by id.
        assert!(artifacts.json_path.ends_with("schemas/snap-1.json"));
        assert!(artifacts.dbml_path.ends_with("schemas/snap-1.dbml"));
    }

    #[tokio::test]
    async fn test_rewrite_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store
            .write_snapshot("snap-1", &schema_with_table("old"))
            .await
            .unwrap();
        let artifacts = store
            .write_snapshot("snap-1", &schema_with_table("new"))
            .await
            .unwrap();

        let dbml = tokio::fs::read_to_string(&artifacts.dbml_path).await.unwrap();
        assert!(dbml.contains("\"new\""));
        assert!(!dbml.contains("\"old\""));
    }
}
