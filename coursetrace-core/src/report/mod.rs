//! Report generation
//!
//! A report is a declarative recipe (see [`defs`]) executed over a cached
//! origin table: project the needed columns, then run the recipe's fixed
//! operation sequence through the pipeline in [`table`]. The generator owns
//! the per-request origin cache, so all reports generated through one
//! generator share raw fetches.

pub mod dedication;
pub mod defs;
pub mod labels;
pub mod origin;
pub mod table;

pub use labels::{EnglishLabels, LabelProvider};
pub use origin::{OriginCache, OriginSpec, OriginTable, ReportScope};
pub use table::{ReportTable, VariableTarget};

use crate::config::{Config, DedicationConfig, JoinConfig};
use crate::error::{Error, Result};
use crate::store::RecordSource;
use crate::value::Value;
use defs::ReportOp;

/// The named reports this module can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    CourseLog,
    CourseDedication,
    CourseModuleLog,
    CourseModuleDedication,
    GradingInterest,
    ForumActivity,
    H5p,
    Badges,
    ChatbotHistory,
}

impl Report {
    /// All reports, in presentation order.
    pub fn all() -> &'static [Report] {
        &[
            Report::CourseLog,
            Report::CourseDedication,
            Report::CourseModuleLog,
            Report::CourseModuleDedication,
            Report::GradingInterest,
            Report::ForumActivity,
            Report::H5p,
            Report::Badges,
            Report::ChatbotHistory,
        ]
    }

    /// Identifier used on the CLI and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Report::CourseLog => "course_log",
            Report::CourseDedication => "course_dedication",
            Report::CourseModuleLog => "course_module_log",
            Report::CourseModuleDedication => "course_module_dedication",
            Report::GradingInterest => "grading_interest",
            Report::ForumActivity => "forum_activity",
            Report::H5p => "h5p",
            Report::Badges => "badges",
            Report::ChatbotHistory => "chatbot_history",
        }
    }

    /// One-line description for listings.
    pub fn describe(&self) -> &'static str {
        match self {
            Report::CourseLog => "Every logged event for the user in the course",
            Report::CourseDedication => "Estimated time-on-task per course session",
            Report::CourseModuleLog => "Events scoped to activity modules, with object names",
            Report::CourseModuleDedication => "Time-on-task per session and module",
            Report::GradingInterest => "Views of the grade report",
            Report::ForumActivity => "Forum events, with discussion names",
            Report::H5p => "H5P interaction attempts and scores",
            Report::Badges => "Badges awarded in the course",
            Report::ChatbotHistory => "Chatbot conversation history",
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Report {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Report::all()
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnknownReport(s.to_string()))
    }
}

/// Executes report recipes for one (user, course) request.
pub struct ReportGenerator<'a> {
    source: &'a dyn RecordSource,
    labels: &'a dyn LabelProvider,
    dedication: DedicationConfig,
    joins: JoinConfig,
    cache: OriginCache<'a>,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(
        source: &'a dyn RecordSource,
        labels: &'a dyn LabelProvider,
        config: &Config,
    ) -> Self {
        Self {
            source,
            labels,
            dedication: config.dedication,
            joins: config.joins,
            cache: OriginCache::new(source),
        }
    }

    /// Generate one report. Configuration errors (a recipe referencing a
    /// missing column) abort only this report; an empty origin produces an
    /// empty report.
    pub fn generate(&mut self, report: Report, scope: ReportScope) -> Result<ReportTable> {
        let def = defs::definition(report);

        let origin = self.cache.load(def.origin, scope)?;
        let mut table = ReportTable::from_origin(origin, def.columns)?;

        for op in def.ops {
            table = self.apply(table, op, def.origin, scope).map_err(|e| {
                if e.is_configuration() {
                    tracing::error!(report = %report, error = %e, "Report definition is miswired");
                }
                e
            })?;
        }

        tracing::info!(report = %report, rows = table.len(), "Report generated");
        Ok(table)
    }

    fn apply(
        &self,
        table: ReportTable,
        op: &ReportOp,
        origin: &OriginSpec,
        scope: ReportScope,
    ) -> Result<ReportTable> {
        match op {
            ReportOp::RequireNonEmpty(column) => table.require_nonempty(column),
            ReportOp::Constrain { column, allowed } => {
                let allowed: Vec<Value> = allowed.iter().map(|v| Value::from(*v)).collect();
                table.constrain(column, &allowed)
            }
            ReportOp::ConstrainToCourse { column } => {
                table.constrain(column, &[Value::Int(scope.courseid)])
            }
            ReportOp::Constant { column, value } => {
                Ok(table.with_constant(column, Value::from(*value)))
            }
            ReportOp::ReadableTime { label_key, source } => {
                table.with_readable_time(&self.labels.label(label_key), source)
            }
            ReportOp::JoinFixed {
                table: target,
                key,
                mapping,
            } => table.join_fixed(self.source, target, key, mapping, &self.joins),
            ReportOp::JoinVariable {
                dispatch,
                key,
                targets,
            } => table.join_variable(self.source, dispatch, key, targets, &self.joins),
            ReportOp::Dedication {
                label_key,
                group_by,
            } => table.with_dedication(
                &self.labels.label(label_key),
                origin.time_column,
                *group_by,
                &self.dedication,
            ),
            ReportOp::Label { column, label_key } => {
                table.rename(column, &self.labels.label(label_key))
            }
        }
    }
}
