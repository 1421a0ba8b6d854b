//! Activity store repository layer
//!
//! The store is the report pipeline's raw-record source. Reports consume it
//! only through the narrow [`RecordSource`] trait: a filtered fetch for
//! origin tables and a keyed bulk lookup for joins. Everything else here
//! (open/migrate/insert) is ingest and test plumbing.

use crate::error::{Error, Result};
use crate::store::schema;
use crate::value::{Row, Value};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Bound parameters per statement. SQLite's variable budget is finite, so
/// IN-lists are chunked at this size regardless of how many keys one logical
/// lookup carries.
const SQLITE_MAX_PARAMS: usize = 900;

/// A column filter: row qualifies when its value for `column` is in `allowed`.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub column: String,
    pub allowed: Vec<Value>,
}

impl FieldFilter {
    pub fn new(column: impl Into<String>, allowed: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            allowed,
        }
    }

    /// Single-value convenience used by report scopes (userid, courseid).
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, vec![value.into()])
    }
}

/// Narrow interface the report layer consumes.
///
/// `fetch` supplies origin tables; `fetch_by_keys` resolves join lookups,
/// returning rows keyed by the canonical string rendering of the key value.
pub trait RecordSource {
    fn fetch(
        &self,
        table: &str,
        filters: &[FieldFilter],
        columns: &[&str],
        order_by: Option<&str>,
    ) -> Result<Vec<Row>>;

    fn fetch_by_keys(
        &self,
        table: &str,
        key_column: &str,
        keys: &[Value],
        columns: &[&str],
    ) -> Result<HashMap<String, Row>>;
}

/// SQLite-backed activity store.
pub struct ActivityStore {
    conn: Mutex<Connection>,
}

impl ActivityStore {
    /// Open or create a store at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this store
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Insert one row into a raw table. Returns the rowid. Ingest and test
    /// seeding go through this; reports never write.
    pub fn insert_row(&self, table: &str, fields: &[(&str, Value)]) -> Result<i64> {
        let declared = known_columns(table)?;
        for (column, _) in fields {
            validate_column(table, declared, column)?;
        }

        let column_list = fields
            .iter()
            .map(|(c, _)| *c)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=fields.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table, column_list, placeholders
        );

        let conn = self.conn.lock().unwrap();
        conn.execute(
            &sql,
            rusqlite::params_from_iter(fields.iter().map(|(_, v)| v)),
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Number of rows in a raw table.
    pub fn count(&self, table: &str) -> Result<i64> {
        known_columns(table)?;
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(n)
    }
}

/// Resolve a table's declared columns, or fail with `UnknownTable`.
fn known_columns(table: &str) -> Result<&'static [&'static str]> {
    schema::table_columns(table).ok_or_else(|| Error::UnknownTable(table.to_string()))
}

/// Identifiers are never interpolated into SQL unless declared in the schema.
fn validate_column(table: &str, declared: &[&str], column: &str) -> Result<()> {
    if declared.contains(&column) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "column `{}` is not declared for table `{}`",
            column, table
        )))
    }
}

/// Read every selected column of the current row into a `Row`.
fn read_row(row: &rusqlite::Row<'_>, columns: &[&str]) -> rusqlite::Result<Row> {
    let mut out = Row::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        let value: rusqlite::types::Value = row.get(i)?;
        out.insert(column.to_string(), Value::from(value));
    }
    Ok(out)
}

impl RecordSource for ActivityStore {
    fn fetch(
        &self,
        table: &str,
        filters: &[FieldFilter],
        columns: &[&str],
        order_by: Option<&str>,
    ) -> Result<Vec<Row>> {
        let declared = known_columns(table)?;
        for column in columns {
            validate_column(table, declared, column)?;
        }
        for filter in filters {
            validate_column(table, declared, &filter.column)?;
            // An empty allowed set can match nothing; skip the query.
            if filter.allowed.is_empty() {
                return Ok(Vec::new());
            }
        }
        if let Some(column) = order_by {
            validate_column(table, declared, column)?;
        }

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), table);
        let mut params: Vec<&Value> = Vec::new();

        if !filters.is_empty() {
            let clauses: Vec<String> = filters
                .iter()
                .map(|f| {
                    let marks = vec!["?"; f.allowed.len()].join(", ");
                    params.extend(f.allowed.iter());
                    format!("{} IN ({})", f.column, marks)
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some(column) = order_by {
            sql.push_str(&format!(" ORDER BY {} ASC, id ASC", column));
        }

        tracing::debug!(table, rows_filtered = filters.len(), "Fetching origin records");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
                read_row(row, columns)
            })?
            .collect::<rusqlite::Result<Vec<Row>>>()?;

        Ok(rows)
    }

    fn fetch_by_keys(
        &self,
        table: &str,
        key_column: &str,
        keys: &[Value],
        columns: &[&str],
    ) -> Result<HashMap<String, Row>> {
        let declared = known_columns(table)?;
        validate_column(table, declared, key_column)?;
        for column in columns {
            validate_column(table, declared, column)?;
        }

        // The key column rides along so results can be keyed even when the
        // caller didn't ask for it.
        let mut selected: Vec<&str> = vec![key_column];
        selected.extend(columns.iter().filter(|c| **c != key_column));

        let mut out = HashMap::with_capacity(keys.len());
        let conn = self.conn.lock().unwrap();

        for chunk in keys.chunks(SQLITE_MAX_PARAMS) {
            let marks = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {} FROM {} WHERE {} IN ({})",
                selected.join(", "),
                table,
                key_column,
                marks
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                    read_row(row, &selected)
                })?
                .collect::<rusqlite::Result<Vec<Row>>>()?;

            for row in rows {
                let Some(key) = row.get(key_column).map(|v| v.key_string()) else {
                    continue;
                };
                out.insert(key, row);
            }
        }

        tracing::debug!(
            table,
            keys = keys.len(),
            matched = out.len(),
            "Resolved join lookup"
        );

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> ActivityStore {
        let store = ActivityStore::open_in_memory().expect("open in-memory store");
        store.migrate().expect("migrate");
        store
    }

    fn log_event(store: &ActivityStore, userid: i64, courseid: i64, time: i64, component: &str) {
        store
            .insert_row(
                "activity_log",
                &[
                    ("eventname", "\\core\\event\\course_viewed".into()),
                    ("component", component.into()),
                    ("action", "viewed".into()),
                    ("contextlevel", Value::Int(50)),
                    ("userid", Value::Int(userid)),
                    ("courseid", Value::Int(courseid)),
                    ("timecreated", Value::Int(time)),
                ],
            )
            .expect("insert log row");
    }

    #[test]
    fn test_fetch_filters_and_projects() {
        let store = test_store();
        log_event(&store, 1, 10, 100, "core");
        log_event(&store, 1, 10, 200, "mod_forum");
        log_event(&store, 2, 10, 300, "core");

        let rows = store
            .fetch(
                "activity_log",
                &[
                    FieldFilter::eq("userid", 1i64),
                    FieldFilter::eq("courseid", 10i64),
                ],
                &["id", "component", "timecreated"],
                Some("timecreated"),
            )
            .expect("fetch");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3, "only projected columns come back");
        assert_eq!(rows[0].get("timecreated"), Some(&Value::Int(100)));
        assert_eq!(rows[1].get("component"), Some(&Value::Text("mod_forum".into())));
    }

    #[test]
    fn test_fetch_empty_filter_set_matches_nothing() {
        let store = test_store();
        log_event(&store, 1, 10, 100, "core");

        let rows = store
            .fetch(
                "activity_log",
                &[FieldFilter::new("userid", vec![])],
                &["id"],
                None,
            )
            .expect("fetch");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_fetch_unknown_table_and_column() {
        let store = test_store();
        assert!(matches!(
            store.fetch("no_such", &[], &["id"], None),
            Err(Error::UnknownTable(_))
        ));
        assert!(store
            .fetch("badge", &[], &["id", "nope"], None)
            .is_err());
    }

    #[test]
    fn test_fetch_by_keys_returns_keyed_rows() {
        let store = test_store();
        store
            .insert_row(
                "badge",
                &[("id", Value::Int(7)), ("courseid", Value::Int(3)), ("name", "X".into())],
            )
            .expect("insert badge");

        let hits = store
            .fetch_by_keys(
                "badge",
                "id",
                &[Value::Int(7), Value::Int(99)],
                &["courseid", "name"],
            )
            .expect("lookup");

        assert_eq!(hits.len(), 1);
        let row = hits.get("7").expect("badge 7");
        assert_eq!(row.get("courseid"), Some(&Value::Int(3)));
        assert_eq!(row.get("name"), Some(&Value::Text("X".into())));
        assert!(!hits.contains_key("99"));
    }

    #[test]
    fn test_insert_row_rejects_undeclared_column() {
        let store = test_store();
        assert!(store
            .insert_row("badge", &[("id", Value::Int(1)), ("bogus", Value::Int(2))])
            .is_err());
    }
}
