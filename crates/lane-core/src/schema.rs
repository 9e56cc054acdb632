//! Canonical schema model produced by introspection.
//!
//! The model is built once per introspection run, entirely in memory, and is
//! never mutated after construction; the serializers in lane-schema render it
//! into the durable artifact formats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root document describing one database at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    pub generated_at: DateTime<Utc>,
    pub database: DatabaseDescriptor,
    /// Tables and views, ordered by name.
    pub tables: Vec<TableDescriptor>,
    /// Derived from foreign key groups across all tables.
    pub relationships: Vec<Relationship>,
}

impl CanonicalSchema {
    /// Look up a table by (case-sensitive) name.
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Driver/dialect identification of the introspected source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    pub driver: String,
    pub dialect: String,
}

/// Whether a catalog object is a table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Table,
    View,
}

/// One table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Unique within the schema, case-sensitive.
    pub name: String,
    pub kind: TableKind,
    /// Columns in catalog declaration order.
    pub columns: Vec<ColumnDescriptor>,
    /// Column names ordered by declared primary key position, not by
    /// declaration order.
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyGroup>,
    pub indexes: Vec<IndexDescriptor>,
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Raw source type string; `None` when the source declares no type.
    pub data_type: Option<String>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub is_primary_key: bool,
    /// 1-based position within the primary key; only set for PK members.
    pub primary_key_position: Option<i64>,
}

/// A (possibly composite) foreign key.
///
/// `columns` and `references.columns` align index-for-index; both are ordered
/// by the source's internal FK sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyGroup {
    pub columns: Vec<String>,
    pub references: ForeignKeyTarget,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
    #[serde(rename = "match")]
    pub match_action: Option<String>,
}

/// The referenced side of a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    pub table: String,
    pub columns: Vec<String>,
}

/// One index on a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Unique within the table.
    pub name: String,
    pub unique: bool,
    /// Provenance, e.g. `"c"` (CREATE INDEX), `"u"` (UNIQUE constraint),
    /// `"pk"` (primary key).
    pub origin: Option<String>,
    pub partial: bool,
    /// Ordered by the index's internal column sequence.
    pub columns: Vec<String>,
}

/// A derived cross-table relationship, one per foreign key group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: RelationshipEnd,
    pub to: RelationshipEnd,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
    #[serde(rename = "match")]
    pub match_action: Option<String>,
}

/// One side of a relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEnd {
    pub table: String,
    pub columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> CanonicalSchema {
        CanonicalSchema {
            generated_at: Utc::now(),
            database: DatabaseDescriptor {
                driver: "sqlite".into(),
                dialect: "sqlite".into(),
            },
            tables: vec![TableDescriptor {
                name: "authors".into(),
                kind: TableKind::Table,
                columns: vec![ColumnDescriptor {
                    name: "id".into(),
                    data_type: Some("INTEGER".into()),
                    nullable: false,
                    default_value: None,
                    is_primary_key: true,
                    primary_key_position: Some(1),
                }],
                primary_key: vec!["id".into()],
                foreign_keys: vec![],
                indexes: vec![],
            }],
            relationships: vec![],
        }
    }

    #[test]
    fn test_table_lookup_is_case_sensitive() {
        let schema = sample_schema();
        assert!(schema.table("authors").is_some());
        assert!(schema.table("Authors").is_none());
    }

    #[test]
    fn test_match_field_serializes_as_match() {
        let fk = ForeignKeyGroup {
            columns: vec!["author_id".into()],
            references: ForeignKeyTarget {
                table: "authors".into(),
                columns: vec!["id".into()],
            },
            on_update: None,
            on_delete: Some("CASCADE".into()),
            match_action: Some("NONE".into()),
        };
        let json = serde_json::to_value(&fk).unwrap();
        assert_eq!(json["match"], "NONE");
        assert_eq!(json["on_delete"], "CASCADE");
        assert!(json.get("match_action").is_none());
    }

    #[test]
    fn test_table_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TableKind::View).unwrap(),
            "\"view\""
        );
    }

    #[test]
    fn test_schema_json_round_trip() {
        let schema = sample_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: CanonicalSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }
}
