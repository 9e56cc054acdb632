//! DBML rendering of a canonical schema.
//!
//! Pure string construction over an already-built [`CanonicalSchema`]; the
//! output is deterministic for a given model.

use lane_core::{CanonicalSchema, ColumnDescriptor, Relationship, TableDescriptor};

/// Render a schema as a DBML document.
///
/// Tables appear in model order, each followed by a blank line; relationship
/// lines come last, deduplicated. The document ends with a trailing newline.
pub fn render(schema: &CanonicalSchema) -> String {
    let mut out = String::new();

    for table in &schema.tables {
        render_table(&mut out, table);
        out.push('\n');
    }

    let mut seen = Vec::new();
    for rel in &schema.relationships {
        let line = render_relationship(rel);
        if !seen.contains(&line) {
            out.push_str(&line);
            out.push('\n');
            seen.push(line);
        }
    }

    out
}

fn render_table(out: &mut String, table: &TableDescriptor) {
    out.push_str(&format!("Table {} {{\n", quote(&table.name)));
    for column in &table.columns {
        // A column is marked unique when it is the sole member of a unique
        // index; composite unique indexes are not a column attribute.
        let unique = table
            .indexes
            .iter()
            .any(|i| i.unique && i.columns.len() == 1 && i.columns[0] == column.name);
        render_column(out, column, unique);
    }
    out.push_str("}\n");
}

fn render_column(out: &mut String, column: &ColumnDescriptor, unique: bool) {
    out.push_str("  ");
    out.push_str(&quote(&column.name));
    if let Some(data_type) = &column.data_type {
        out.push(' ');
        out.push_str(data_type);
    }

    let mut attrs = Vec::new();
    if column.is_primary_key {
        attrs.push("pk".to_string());
    }
    if !column.nullable {
        attrs.push("not null".to_string());
    }
    if unique && !column.is_primary_key {
        attrs.push("unique".to_string());
    }
    if let Some(default) = &column.default_value {
        attrs.push(format!("default: {default}"));
    }
    if !attrs.is_empty() {
        out.push_str(&format!(" [{}]", attrs.join(", ")));
    }
    out.push('\n');
}

fn render_relationship(rel: &Relationship) -> String {
    format!(
        "Ref: {} > {}",
        render_end(&rel.from.table, &rel.from.columns),
        render_end(&rel.to.table, &rel.to.columns)
    )
}

fn render_end(table: &str, columns: &[String]) -> String {
    match columns {
        [single] => format!("{}.{}", quote(table), quote(single)),
        many => format!(
            "{}.({})",
            quote(table),
            many.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Quote an identifier, escaping embedded double quotes.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\\\""))
}
