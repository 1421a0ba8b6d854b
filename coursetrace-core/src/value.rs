//! Scalar values and rows
//!
//! Every table in the report pipeline is an ordered column list plus rows of
//! `column name -> Value`. Values are the four scalar shapes the raw stores
//! produce; richer typing happens at the report boundary (labels, formatted
//! times), not here.

use std::collections::HashMap;
use std::fmt;

/// A single cell value in a raw or derived table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

/// A row: mapping from column name to value. Column order lives on the
/// owning table, not on the row.
pub type Row = HashMap<String, Value>;

impl Value {
    /// Empty means SQL NULL or the empty string. Used by `require_nonempty`
    /// and by origin-table required-column checks.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Integer view, accepting numeric text. Timestamp columns are read
    /// through this.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) => Some(*f as i64),
            Value::Text(s) => s.parse().ok(),
            Value::Null => None,
        }
    }

    /// Canonical key rendering used wherever a value indexes a map:
    /// join-key lookups and dedication group keys. Distinct scalars must
    /// render distinctly; `Int(7)` and `Text("7")` intentionally collide
    /// because the raw stores are not consistent about id column affinity.
    pub fn key_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<rusqlite::types::Value> for Value {
    fn from(v: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value as Sql;
        match v {
            Sql::Null => Value::Null,
            Sql::Integer(n) => Value::Int(n),
            Sql::Real(f) => Value::Float(f),
            Sql::Text(s) => Value::Text(s),
            // Raw course stores keep no blob columns; treat one as absent.
            Sql::Blob(_) => Value::Null,
        }
    }
}

impl rusqlite::types::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, ValueRef};
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Int(n) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*n)),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}
