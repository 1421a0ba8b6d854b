//! Origin table loading and per-request caching
//!
//! An origin table is the raw record set one report family starts from:
//! the standard activity log, H5P attempts, badge awards, or the chatbot
//! history. Reports for one (user, course) pass frequently share an origin,
//! so the loader caches each source table after its first fetch.

use crate::error::Result;
use crate::store::{FieldFilter, RecordSource};
use crate::value::Row;
use std::collections::HashMap;

/// Static description of a raw source a report family reads.
#[derive(Debug, Clone, Copy)]
pub struct OriginSpec {
    /// Raw table name in the record source
    pub table: &'static str,
    /// Column holding the event's epoch-seconds timestamp
    pub time_column: &'static str,
    /// Column the user scope filters on
    pub user_column: &'static str,
    /// Column the course scope filters on; None when course membership is
    /// only resolvable through a join (badge awards)
    pub course_column: Option<&'static str>,
    /// Columns loaded from the source
    pub columns: &'static [&'static str],
    /// Columns that must be non-empty for a row to stay valid anywhere
    /// downstream; always includes the id and time columns
    pub required: &'static [&'static str],
}

/// The (user, course) pair a report-generation pass is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportScope {
    pub userid: i64,
    pub courseid: i64,
}

impl ReportScope {
    pub fn new(userid: i64, courseid: i64) -> Self {
        Self { userid, courseid }
    }
}

/// A loaded raw table plus its load-time row-validity requirements.
#[derive(Debug, Clone)]
pub struct OriginTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub required: Vec<String>,
}

impl OriginTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Per-request origin cache, keyed by raw table name.
///
/// The first `load` for a table fetches through the record source; later
/// loads return the cached table unconditionally. Call sites within one
/// generation pass use identical filters by contract, so filter arguments
/// are not part of the cache key.
pub struct OriginCache<'a> {
    source: &'a dyn RecordSource,
    tables: HashMap<&'static str, OriginTable>,
}

impl<'a> OriginCache<'a> {
    pub fn new(source: &'a dyn RecordSource) -> Self {
        Self {
            source,
            tables: HashMap::new(),
        }
    }

    /// Fetch (or reuse) the origin table for `spec`, scoped to one user and
    /// course, ordered ascending by the origin's time column. Zero matching
    /// rows is an empty table, not an error.
    pub fn load(&mut self, spec: &OriginSpec, scope: ReportScope) -> Result<&OriginTable> {
        if self.tables.contains_key(spec.table) {
            tracing::debug!(table = spec.table, "Reusing cached origin table");
            return Ok(&self.tables[spec.table]);
        }

        let mut filters = vec![FieldFilter::eq(spec.user_column, scope.userid)];
        if let Some(course_column) = spec.course_column {
            filters.push(FieldFilter::eq(course_column, scope.courseid));
        }

        let rows = self
            .source
            .fetch(spec.table, &filters, spec.columns, Some(spec.time_column))?;

        tracing::debug!(table = spec.table, rows = rows.len(), "Loaded origin table");

        let table = OriginTable {
            columns: spec.columns.iter().map(|c| c.to_string()).collect(),
            rows,
            required: spec.required.iter().map(|c| c.to_string()).collect(),
        };

        Ok(self.tables.entry(spec.table).or_insert(table))
    }
}
