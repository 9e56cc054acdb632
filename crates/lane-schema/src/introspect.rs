//! SQLite catalog introspection.
//!
//! Walks `sqlite_master` plus the `table_info`, `foreign_key_list`,
//! `index_list`, and `index_info` pragmas and assembles a [`CanonicalSchema`].
//! Catalog walk order is deterministic (tables by name, FK rows by
//! (id, seq), index columns by seqno), so introspecting an unchanged source
//! twice yields an identical model apart from the timestamp.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;
use tracing::warn;

use lane_core::{
    CanonicalSchema, ColumnDescriptor, DatabaseDescriptor, Error, ForeignKeyGroup,
    ForeignKeyTarget, IndexDescriptor, Relationship, RelationshipEnd, Result, TableDescriptor,
    TableKind,
};

use crate::source::open_read_only;

/// Introspect the SQLite database behind `dsn`.
pub async fn introspect(dsn: &str) -> Result<CanonicalSchema> {
    let mut conn = open_read_only(dsn).await?;
    introspect_with(&mut conn).await
}

/// Introspect over an existing connection.
pub async fn introspect_with(conn: &mut SqliteConnection) -> Result<CanonicalSchema> {
    let mut tables = Vec::new();
    for (name, kind) in list_objects(conn).await? {
        let columns = table_columns(conn, &name).await?;
        let mut primary_key: Vec<(i64, String)> = columns
            .iter()
            .filter_map(|c| c.primary_key_position.map(|pos| (pos, c.name.clone())))
            .collect();
        primary_key.sort_by_key(|(pos, _)| *pos);

        // Views carry no constraints or indexes of their own.
        let (foreign_keys, indexes) = match kind {
            TableKind::Table => (
                foreign_key_groups(conn, &name).await?,
                table_indexes(conn, &name).await?,
            ),
            TableKind::View => (Vec::new(), Vec::new()),
        };

        tables.push(TableDescriptor {
            name,
            kind,
            columns,
            primary_key: primary_key.into_iter().map(|(_, name)| name).collect(),
            foreign_keys,
            indexes,
        });
    }

    let relationships = derive_relationships(&tables);

    Ok(CanonicalSchema {
        generated_at: Utc::now(),
        database: DatabaseDescriptor {
            driver: "sqlite".to_string(),
            dialect: "sqlite".to_string(),
        },
        tables,
        relationships,
    })
}

fn catalog_err(context: &str, e: sqlx::Error) -> Error {
    Error::Introspection(format!("{context}: {e}"))
}

/// User tables and views, by name, excluding SQLite's internal objects.
async fn list_objects(conn: &mut SqliteConnection) -> Result<Vec<(String, TableKind)>> {
    let rows = sqlx::query(
        "SELECT name, type FROM sqlite_master
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| catalog_err("listing catalog objects", e))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let name: String = row.get("name");
            let object_type: String = row.get("type");
            let kind = if object_type == "view" {
                TableKind::View
            } else {
                TableKind::Table
            };
            (name, kind)
        })
        .collect())
}

async fn table_columns(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ColumnDescriptor>> {
    // The pragma_* table-valued functions take the object name as a bindable
    // argument, unlike the PRAGMA statement form.
    let rows = sqlx::query("SELECT * FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| catalog_err(&format!("reading columns of '{table}'"), e))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let data_type: String = row.get("type");
            let notnull: i64 = row.get("notnull");
            let pk: i64 = row.get("pk");
            ColumnDescriptor {
                name: row.get("name"),
                // SQLite allows typeless column declarations.
                data_type: (!data_type.is_empty()).then_some(data_type),
                nullable: notnull == 0,
                default_value: row.get("dflt_value"),
                is_primary_key: pk > 0,
                primary_key_position: (pk > 0).then_some(pk),
            }
        })
        .collect())
}

/// Foreign keys grouped by constraint id.
///
/// `foreign_key_list` emits one row per column pair; rows sharing an id form
/// one (possibly composite) constraint, ordered by seq. Actions are per
/// constraint, so they are read off the first row of each group.
async fn foreign_key_groups(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ForeignKeyGroup>> {
    let rows = sqlx::query("SELECT * FROM pragma_foreign_key_list(?) ORDER BY id, seq")
        .bind(table)
        .fetch_all(&mut *conn)
    .await
    .map_err(|e| catalog_err(&format!("reading foreign keys of '{table}'"), e))?;

    let mut groups: BTreeMap<i64, ForeignKeyGroup> = BTreeMap::new();
    for row in rows {
        let id: i64 = row.get("id");
        let from: String = row.get("from");
        let to: Option<String> = row.get("to");
        // A NULL target column means the FK references an implicit primary
        // key we cannot resolve from the catalog; skip the pair.
        let Some(to) = to else {
            warn!(
                subsystem = "schema",
                table,
                column = %from,
                "skipping foreign key column with unresolvable target"
            );
            continue;
        };

        let group = groups.entry(id).or_insert_with(|| ForeignKeyGroup {
            columns: Vec::new(),
            references: ForeignKeyTarget {
                table: row.get("table"),
                columns: Vec::new(),
            },
            on_update: row.get("on_update"),
            on_delete: row.get("on_delete"),
            match_action: row.get("match"),
        });
        group.columns.push(from);
        group.references.columns.push(to);
    }

    Ok(groups.into_values().filter(|g| !g.columns.is_empty()).collect())
}

async fn table_indexes(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<IndexDescriptor>> {
    let rows = sqlx::query("SELECT * FROM pragma_index_list(?) ORDER BY name")
        .bind(table)
        .fetch_all(&mut *conn)
    .await
    .map_err(|e| catalog_err(&format!("reading indexes of '{table}'"), e))?;

    let mut indexes = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.get("name");
        let unique: i64 = row.get("unique");
        let partial: i64 = row.get("partial");
        let origin: Option<String> = row.get("origin");
        let columns = index_columns(conn, &name).await?;
        indexes.push(IndexDescriptor {
            name,
            unique: unique != 0,
            origin,
            partial: partial != 0,
            columns,
        });
    }
    Ok(indexes)
}

async fn index_columns(conn: &mut SqliteConnection, index: &str) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT * FROM pragma_index_info(?) ORDER BY seqno")
        .bind(index)
        .fetch_all(&mut *conn)
    .await
    .map_err(|e| catalog_err(&format!("reading columns of index '{index}'"), e))?;

    // Expression and rowid members have no column name; they are omitted.
    Ok(rows
        .into_iter()
        .filter_map(|row| row.get::<Option<String>, _>("name"))
        .collect())
}

/// Flatten per-table foreign key groups into schema-level relationships.
///
/// A group referencing a table that does not exist in the catalog (possible
/// with foreign key enforcement off) is dropped with a warning rather than
/// producing a dangling edge.
fn derive_relationships(tables: &[TableDescriptor]) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    for table in tables {
        for fk in &table.foreign_keys {
            let target_exists = tables
                .iter()
                .any(|t| t.kind == TableKind::Table && t.name == fk.references.table);
            if !target_exists {
                warn!(
                    subsystem = "schema",
                    table = %table.name,
                    target = %fk.references.table,
                    "skipping relationship to a table missing from the catalog"
                );
                continue;
            }
            relationships.push(Relationship {
                from: RelationshipEnd {
                    table: table.name.clone(),
                    columns: fk.columns.clone(),
                },
                to: RelationshipEnd {
                    table: fk.references.table.clone(),
                    columns: fk.references.columns.clone(),
                },
                on_update: fk.on_update.clone(),
                on_delete: fk.on_delete.clone(),
                match_action: fk.match_action.clone(),
            });
        }
    }
    relationships
}
