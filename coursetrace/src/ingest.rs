//! Loading raw records from a JSON dump
//!
//! The dump maps raw table names to arrays of row objects, the shape a host
//! platform export produces. Unknown tables and undeclared columns are
//! rejected by the store, so a malformed dump fails loudly instead of
//! inserting garbage.

use anyhow::{bail, Context, Result};
use coursetrace_core::{ActivityStore, Value};
use std::path::Path;

/// Insert every row of the dump. Returns the number of rows inserted.
pub fn ingest_file(store: &ActivityStore, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let dump: serde_json::Value = serde_json::from_str(&content)?;

    let Some(tables) = dump.as_object() else {
        bail!("dump root must be an object of table -> rows");
    };

    let mut inserted = 0usize;
    for (table, rows) in tables {
        let rows = rows
            .as_array()
            .with_context(|| format!("`{}` must hold an array of rows", table))?;

        for (index, row) in rows.iter().enumerate() {
            let object = row
                .as_object()
                .with_context(|| format!("`{}`[{}] must be an object", table, index))?;

            let fields: Vec<(&str, Value)> = object
                .iter()
                .map(|(column, value)| (column.as_str(), json_scalar(value)))
                .collect();

            store
                .insert_row(table, &fields)
                .with_context(|| format!("inserting `{}`[{}]", table, index))?;
            inserted += 1;
        }

        tracing::info!(table, rows = rows.len(), "Ingested table");
    }

    Ok(inserted)
}

fn json_scalar(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Int(i64::from(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        // Nested structures land in JSON-typed columns as text.
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(
            &path,
            r#"{
                "badge": [ { "id": 7, "courseid": 3, "name": "X" } ],
                "badge_awards": [ { "badgeid": 7, "userid": 1, "dateissued": 500 } ]
            }"#,
        )
        .unwrap();

        let store = ActivityStore::open_in_memory().unwrap();
        store.migrate().unwrap();

        let inserted = ingest_file(&store, &path).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.count("badge").unwrap(), 1);
    }

    #[test]
    fn test_ingest_rejects_unknown_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(&path, r#"{ "mystery": [ { "id": 1 } ] }"#).unwrap();

        let store = ActivityStore::open_in_memory().unwrap();
        store.migrate().unwrap();

        assert!(ingest_file(&store, &path).is_err());
    }
}
