//! The report table pipeline
//!
//! A [`ReportTable`] wraps an in-memory record set. Every operation consumes
//! the current table and returns the next state, so a report definition is a
//! plain chain of calls and each intermediate state is inspectable in tests.
//! Operations never mutate a row in place once produced.
//!
//! Referencing a column the table does not have is a configuration error
//! (a miswired report definition) and aborts that report. Missing join
//! targets and empty inputs are data conditions, not errors: they degrade
//! to placeholder defaults and empty tables.

use crate::config::{DedicationConfig, JoinConfig};
use crate::error::{Error, Result};
use crate::format::format_epoch_seconds;
use crate::report::dedication::segment_sessions;
use crate::report::origin::OriginTable;
use crate::store::RecordSource;
use crate::value::{Row, Value};
use std::collections::{HashMap, HashSet};

/// One target of a variable join: a raw table name as it appears in the
/// dispatch column, with its own source-to-destination column mapping
/// (different raw tables name the same semantic field differently).
#[derive(Debug, Clone, Copy)]
pub struct VariableTarget {
    pub table: &'static str,
    pub mapping: &'static [(&'static str, &'static str)],
}

/// An in-memory derived table: ordered column list plus rows.
#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ReportTable {
    /// Build directly from columns and rows (tests, hand-built tables).
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Project a sub-table out of a loaded origin. Rows whose load-time
    /// required columns are empty are dropped here, before any operation
    /// sees them.
    pub fn from_origin(origin: &OriginTable, columns: &[&str]) -> Result<Self> {
        for column in columns {
            if !origin.columns.iter().any(|c| c == column) {
                return Err(Error::ColumnNotFound {
                    column: column.to_string(),
                    operation: "origin projection",
                });
            }
        }

        let rows = origin
            .rows
            .iter()
            .filter(|row| {
                origin
                    .required
                    .iter()
                    .all(|req| row.get(req).is_some_and(|v| !v.is_empty()))
            })
            .map(|row| {
                columns
                    .iter()
                    .filter_map(|c| row.get(*c).map(|v| (c.to_string(), v.clone())))
                    .collect()
            })
            .collect();

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Terminal operation: the finished ordered rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    fn require_column(&self, column: &str, operation: &'static str) -> Result<()> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(Error::ColumnNotFound {
                column: column.to_string(),
                operation,
            })
        }
    }

    /// Restrict to exactly `columns`, in that order, preserving row order.
    pub fn project(self, columns: &[&str]) -> Result<Self> {
        for column in columns {
            self.require_column(column, "project")?;
        }

        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .filter_map(|c| row.remove(*c).map(|v| (c.to_string(), v)))
                    .collect()
            })
            .collect();

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Drop rows whose value for `column` is null or the empty string.
    pub fn require_nonempty(mut self, column: &str) -> Result<Self> {
        self.require_column(column, "require_nonempty")?;
        self.rows
            .retain(|row| row.get(column).is_some_and(|v| !v.is_empty()));
        Ok(self)
    }

    /// Keep only rows whose value for `column` is in `allowed`. Values are
    /// compared by canonical key rendering, so integer-affinity columns
    /// match their textual spellings. Idempotent.
    pub fn constrain(mut self, column: &str, allowed: &[Value]) -> Result<Self> {
        self.require_column(column, "constrain")?;
        let allowed: Vec<String> = allowed.iter().map(|v| v.key_string()).collect();
        self.rows.retain(|row| {
            row.get(column)
                .is_some_and(|v| allowed.iter().any(|a| *a == v.key_string()))
        });
        Ok(self)
    }

    /// Append a constant column; an existing column of the same name is
    /// overwritten.
    pub fn with_constant(mut self, name: &str, value: Value) -> Self {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
        for row in &mut self.rows {
            row.insert(name.to_string(), value.clone());
        }
        self
    }

    /// Structural rename. Fails if `old` is absent or `new` already exists.
    pub fn rename(mut self, old: &str, new: &str) -> Result<Self> {
        self.require_column(old, "rename")?;
        if self.columns.iter().any(|c| c == new) {
            return Err(Error::Config(format!(
                "rename target `{}` already exists",
                new
            )));
        }

        for column in &mut self.columns {
            if column == old {
                *column = new.to_string();
            }
        }
        for row in &mut self.rows {
            if let Some(value) = row.remove(old) {
                row.insert(new.to_string(), value);
            }
        }
        Ok(self)
    }

    /// Add a column holding `source`'s epoch-seconds value formatted as a
    /// local date-time string. The source column is retained.
    pub fn with_readable_time(mut self, label: &str, source: &str) -> Result<Self> {
        self.require_column(source, "readable time")?;
        if !self.columns.iter().any(|c| c == label) {
            self.columns.push(label.to_string());
        }

        for row in &mut self.rows {
            let formatted = row
                .get(source)
                .and_then(|v| v.as_i64())
                .map(format_epoch_seconds)
                .unwrap_or_default();
            row.insert(label.to_string(), Value::Text(formatted));
        }
        Ok(self)
    }

    /// Distinct non-empty values of `column`, in first-seen row order.
    fn distinct_keys(&self, column: &str) -> Vec<Value> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut keys = Vec::new();
        for row in &self.rows {
            if let Some(value) = row.get(column).filter(|v| !v.is_empty()) {
                if seen.insert(value.key_string()) {
                    keys.push(value.clone());
                }
            }
        }
        keys
    }

    /// Ensure destination columns exist with empty-string placeholders, so a
    /// join miss leaves a well-defined default rather than a hole.
    fn ensure_placeholders<'m>(&mut self, destinations: impl Iterator<Item = &'m str>) {
        for dest in destinations {
            if !self.columns.iter().any(|c| c == dest) {
                self.columns.push(dest.to_string());
                for row in &mut self.rows {
                    row.insert(dest.to_string(), Value::Text(String::new()));
                }
            }
        }
    }

    /// Join against a statically-named lookup table.
    ///
    /// `key_column` holds the foreign key; it is resolved against the
    /// target's primary key (`id`). Lookups are bulk: the distinct key set
    /// is fetched in batches of `config.lookup_batch_size`, never one query
    /// per row. Rows with no match keep their placeholder defaults.
    pub fn join_fixed(
        mut self,
        source: &dyn RecordSource,
        target_table: &str,
        key_column: &str,
        mapping: &[(&str, &str)],
        config: &JoinConfig,
    ) -> Result<Self> {
        self.require_column(key_column, "fixed join")?;
        self.ensure_placeholders(mapping.iter().map(|(_, dest)| *dest));

        let keys = self.distinct_keys(key_column);
        if keys.is_empty() {
            return Ok(self);
        }

        let target_columns: Vec<&str> = mapping.iter().map(|(src, _)| *src).collect();
        let mut resolved: HashMap<String, Row> = HashMap::with_capacity(keys.len());
        for chunk in keys.chunks(config.lookup_batch_size.max(1)) {
            resolved.extend(source.fetch_by_keys(target_table, "id", chunk, &target_columns)?);
        }

        for row in &mut self.rows {
            let Some(key) = row.get(key_column).filter(|v| !v.is_empty()) else {
                continue;
            };
            let Some(hit) = resolved.get(&key.key_string()) else {
                continue;
            };
            for (src, dest) in mapping {
                if let Some(value) = hit.get(*src) {
                    row.insert(dest.to_string(), value.clone());
                }
            }
        }

        Ok(self)
    }

    /// Join where the target table name is read per-row from
    /// `dispatch_column` and each known table name carries its own column
    /// mapping. Rows whose dispatch value has no entry in `targets` keep
    /// their placeholder defaults. At most `config.max_targets` distinct
    /// table names are probed; the rest are skipped with a warning.
    pub fn join_variable(
        mut self,
        source: &dyn RecordSource,
        dispatch_column: &str,
        key_column: &str,
        targets: &[VariableTarget],
        config: &JoinConfig,
    ) -> Result<Self> {
        self.require_column(dispatch_column, "variable join")?;
        self.require_column(key_column, "variable join")?;
        self.ensure_placeholders(
            targets
                .iter()
                .flat_map(|t| t.mapping.iter().map(|(_, dest)| *dest)),
        );

        // Distinct dispatch values in first-seen order, capped.
        let mut probe_order: Vec<String> = Vec::new();
        let mut skipped = 0usize;
        for row in &self.rows {
            let Some(name) = row.get(dispatch_column).filter(|v| !v.is_empty()) else {
                continue;
            };
            let name = name.key_string();
            if probe_order.contains(&name) {
                continue;
            }
            if probe_order.len() >= config.max_targets {
                skipped += 1;
                continue;
            }
            probe_order.push(name);
        }
        if skipped > 0 {
            tracing::warn!(
                dispatch_column,
                max_targets = config.max_targets,
                skipped_rows = skipped,
                "Variable join target cap reached; unprobed rows keep defaults"
            );
        }

        for name in probe_order {
            let Some(target) = targets.iter().find(|t| t.table == name) else {
                continue;
            };

            let keys: Vec<Value> = {
                let mut seen: HashSet<String> = HashSet::new();
                let mut keys = Vec::new();
                for row in &self.rows {
                    let dispatched = row
                        .get(dispatch_column)
                        .is_some_and(|v| v.key_string() == name);
                    if !dispatched {
                        continue;
                    }
                    if let Some(key) = row.get(key_column).filter(|v| !v.is_empty()) {
                        if seen.insert(key.key_string()) {
                            keys.push(key.clone());
                        }
                    }
                }
                keys
            };
            if keys.is_empty() {
                continue;
            }

            let target_columns: Vec<&str> = target.mapping.iter().map(|(src, _)| *src).collect();
            let mut resolved: HashMap<String, Row> = HashMap::with_capacity(keys.len());
            for chunk in keys.chunks(config.lookup_batch_size.max(1)) {
                resolved.extend(source.fetch_by_keys(
                    target.table,
                    "id",
                    chunk,
                    &target_columns,
                )?);
            }

            for row in &mut self.rows {
                let dispatched = row
                    .get(dispatch_column)
                    .is_some_and(|v| v.key_string() == name);
                if !dispatched {
                    continue;
                }
                let Some(hit) = row
                    .get(key_column)
                    .and_then(|key| resolved.get(&key.key_string()))
                else {
                    continue;
                };
                let copied: Vec<(String, Value)> = target
                    .mapping
                    .iter()
                    .filter_map(|(src, dest)| {
                        hit.get(*src).map(|v| (dest.to_string(), v.clone()))
                    })
                    .collect();
                for (dest, value) in copied {
                    row.insert(dest, value);
                }
            }
        }

        Ok(self)
    }

    /// Segment rows into dedication sessions (§ dedication module) and
    /// reduce the table to one representative row per session, with the
    /// estimated seconds appended under `label`. Rows must already be
    /// ascending by `time_column`.
    pub fn with_dedication(
        self,
        label: &str,
        time_column: &str,
        group_by: Option<&str>,
        config: &DedicationConfig,
    ) -> Result<Self> {
        self.require_column(time_column, "dedication")?;
        if let Some(key_column) = group_by {
            self.require_column(key_column, "dedication")?;
        }

        let sessions = segment_sessions(&self.rows, time_column, group_by, config)?;

        let mut columns = self.columns.clone();
        if !columns.iter().any(|c| c == label) {
            columns.push(label.to_string());
        }

        let rows = sessions
            .into_iter()
            .map(|span| {
                let mut row = self.rows[span.row_index].clone();
                row.insert(label.to_string(), Value::Int(span.dedication_secs));
                row
            })
            .collect();

        Ok(Self { columns, rows })
    }
}
