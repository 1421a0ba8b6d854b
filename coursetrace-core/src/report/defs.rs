//! Declarative report definitions
//!
//! Each named report is data: an origin, an initial projection, and a fixed
//! operation sequence. The generator in [`crate::report`] interprets these;
//! nothing in this module executes anything. Adding a report means adding a
//! table here, not writing new pipeline code.

use crate::report::origin::OriginSpec;
use crate::report::table::VariableTarget;
use crate::report::Report;

/// One step of a report's operation sequence.
#[derive(Debug, Clone, Copy)]
pub enum ReportOp {
    /// Drop rows with a null/empty value in `column`
    RequireNonEmpty(&'static str),
    /// Keep rows whose `column` value is in `allowed` (canonical rendering)
    Constrain {
        column: &'static str,
        allowed: &'static [&'static str],
    },
    /// Keep rows whose `column` value equals the scope's course id
    ConstrainToCourse { column: &'static str },
    /// Append a constant text column (placeholder declaration for joins)
    Constant {
        column: &'static str,
        value: &'static str,
    },
    /// Add a human-readable local date-time column from epoch seconds
    ReadableTime {
        label_key: &'static str,
        source: &'static str,
    },
    /// Join a statically-named lookup table on `key` against its id
    JoinFixed {
        table: &'static str,
        key: &'static str,
        mapping: &'static [(&'static str, &'static str)],
    },
    /// Join whose target table name is read per-row from `dispatch`
    JoinVariable {
        dispatch: &'static str,
        key: &'static str,
        targets: &'static [VariableTarget],
    },
    /// Segment into sessions; one representative row per session
    Dedication {
        label_key: &'static str,
        group_by: Option<&'static str>,
    },
    /// Rename a raw column to its human-readable label
    Label {
        column: &'static str,
        label_key: &'static str,
    },
}

/// A complete report recipe.
#[derive(Debug, Clone, Copy)]
pub struct ReportDefinition {
    pub origin: &'static OriginSpec,
    pub columns: &'static [&'static str],
    pub ops: &'static [ReportOp],
}

// ============================================
// Origins
// ============================================

pub static ORIGIN_LOG: OriginSpec = OriginSpec {
    table: "activity_log",
    time_column: "timecreated",
    user_column: "userid",
    course_column: Some("courseid"),
    columns: &[
        "id",
        "eventname",
        "component",
        "action",
        "target",
        "objecttable",
        "objectid",
        "contextlevel",
        "contextinstanceid",
        "timecreated",
    ],
    required: &["id", "timecreated"],
};

pub static ORIGIN_H5P: OriginSpec = OriginSpec {
    table: "h5p_attempts",
    time_column: "timecreated",
    user_column: "userid",
    course_column: Some("courseid"),
    columns: &[
        "id",
        "activityid",
        "interactiontype",
        "rawscore",
        "maxscore",
        "timecreated",
    ],
    required: &["id", "timecreated"],
};

// Badge awards carry no course column; course membership resolves through
// the badge lookup join, then the course constraint.
pub static ORIGIN_BADGES: OriginSpec = OriginSpec {
    table: "badge_awards",
    time_column: "dateissued",
    user_column: "userid",
    course_column: None,
    columns: &["id", "badgeid", "dateissued"],
    required: &["id", "dateissued"],
};

pub static ORIGIN_CHATBOT: OriginSpec = OriginSpec {
    table: "chatbot_log",
    time_column: "timecreated",
    user_column: "userid",
    course_column: Some("courseid"),
    columns: &["id", "speaker", "message", "timecreated"],
    required: &["id", "timecreated"],
};

// ============================================
// Variable-join dispatch tables
// ============================================

/// Raw tables a course-module event's `objecttable` may point at, each with
/// its own spelling of the object-name column.
const MODULE_OBJECT_TARGETS: &[VariableTarget] = &[
    VariableTarget {
        table: "book_chapters",
        mapping: &[("title", "object_name")],
    },
    VariableTarget {
        table: "forum_discussions",
        mapping: &[("name", "object_name")],
    },
];

const FORUM_OBJECT_TARGETS: &[VariableTarget] = &[VariableTarget {
    table: "forum_discussions",
    mapping: &[("name", "object_name")],
}];

// ============================================
// Report recipes
// ============================================

static COURSE_LOG: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_LOG,
    columns: &["id", "eventname", "component", "action", "target", "timecreated"],
    ops: &[
        ReportOp::ReadableTime {
            label_key: "column_time",
            source: "timecreated",
        },
        ReportOp::Label {
            column: "eventname",
            label_key: "column_event",
        },
        ReportOp::Label {
            column: "component",
            label_key: "column_component",
        },
        ReportOp::Label {
            column: "action",
            label_key: "column_action",
        },
        ReportOp::Label {
            column: "target",
            label_key: "column_target",
        },
    ],
};

static COURSE_DEDICATION: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_LOG,
    columns: &["id", "timecreated"],
    ops: &[
        ReportOp::Dedication {
            label_key: "column_dedication",
            group_by: None,
        },
        ReportOp::ReadableTime {
            label_key: "column_session_start",
            source: "timecreated",
        },
    ],
};

static COURSE_MODULE_LOG: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_LOG,
    columns: &[
        "id",
        "eventname",
        "component",
        "action",
        "objecttable",
        "objectid",
        "contextlevel",
        "contextinstanceid",
        "timecreated",
    ],
    ops: &[
        // Module-context events only (context level 70 = activity module).
        ReportOp::Constrain {
            column: "contextlevel",
            allowed: &["70"],
        },
        ReportOp::RequireNonEmpty("contextinstanceid"),
        ReportOp::Constant {
            column: "object_name",
            value: "",
        },
        ReportOp::JoinVariable {
            dispatch: "objecttable",
            key: "objectid",
            targets: MODULE_OBJECT_TARGETS,
        },
        ReportOp::ReadableTime {
            label_key: "column_time",
            source: "timecreated",
        },
        ReportOp::Label {
            column: "eventname",
            label_key: "column_event",
        },
        ReportOp::Label {
            column: "component",
            label_key: "column_component",
        },
        ReportOp::Label {
            column: "action",
            label_key: "column_action",
        },
        ReportOp::Label {
            column: "objecttable",
            label_key: "column_object_table",
        },
        ReportOp::Label {
            column: "object_name",
            label_key: "column_object_name",
        },
    ],
};

static COURSE_MODULE_DEDICATION: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_LOG,
    columns: &["id", "component", "contextlevel", "contextinstanceid", "timecreated"],
    ops: &[
        ReportOp::Constrain {
            column: "contextlevel",
            allowed: &["70"],
        },
        ReportOp::RequireNonEmpty("contextinstanceid"),
        // Dedication runs on the time-sorted view before any decoration so
        // the timestamp column it reads is untouched.
        ReportOp::Dedication {
            label_key: "column_dedication",
            group_by: Some("contextinstanceid"),
        },
        ReportOp::Constant {
            column: "module_name",
            value: "",
        },
        ReportOp::JoinFixed {
            table: "course_modules",
            key: "contextinstanceid",
            mapping: &[("module", "moduleid")],
        },
        ReportOp::JoinFixed {
            table: "modules",
            key: "moduleid",
            mapping: &[("name", "module_name")],
        },
        ReportOp::ReadableTime {
            label_key: "column_session_start",
            source: "timecreated",
        },
        ReportOp::Label {
            column: "component",
            label_key: "column_component",
        },
        ReportOp::Label {
            column: "module_name",
            label_key: "column_module_name",
        },
    ],
};

static GRADING_INTEREST: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_LOG,
    columns: &["id", "eventname", "component", "action", "target", "timecreated"],
    ops: &[
        ReportOp::Constrain {
            column: "target",
            allowed: &["grade_report"],
        },
        ReportOp::Constrain {
            column: "action",
            allowed: &["viewed"],
        },
        ReportOp::ReadableTime {
            label_key: "column_time",
            source: "timecreated",
        },
        ReportOp::Label {
            column: "eventname",
            label_key: "column_event",
        },
        ReportOp::Label {
            column: "component",
            label_key: "column_component",
        },
        ReportOp::Label {
            column: "action",
            label_key: "column_action",
        },
        ReportOp::Label {
            column: "target",
            label_key: "column_target",
        },
    ],
};

static FORUM_ACTIVITY: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_LOG,
    columns: &[
        "id",
        "component",
        "action",
        "target",
        "objecttable",
        "objectid",
        "timecreated",
    ],
    ops: &[
        ReportOp::Constrain {
            column: "component",
            allowed: &["mod_forum"],
        },
        ReportOp::Constant {
            column: "object_name",
            value: "",
        },
        // Posts and subscriptions have no entry here and keep the default.
        ReportOp::JoinVariable {
            dispatch: "objecttable",
            key: "objectid",
            targets: FORUM_OBJECT_TARGETS,
        },
        ReportOp::ReadableTime {
            label_key: "column_time",
            source: "timecreated",
        },
        ReportOp::Label {
            column: "action",
            label_key: "column_action",
        },
        ReportOp::Label {
            column: "target",
            label_key: "column_target",
        },
        ReportOp::Label {
            column: "objecttable",
            label_key: "column_object_table",
        },
        ReportOp::Label {
            column: "object_name",
            label_key: "column_object_name",
        },
    ],
};

static H5P: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_H5P,
    columns: &["id", "interactiontype", "rawscore", "maxscore", "timecreated"],
    ops: &[
        ReportOp::ReadableTime {
            label_key: "column_time",
            source: "timecreated",
        },
        ReportOp::Label {
            column: "interactiontype",
            label_key: "column_interaction",
        },
        ReportOp::Label {
            column: "rawscore",
            label_key: "column_score",
        },
        ReportOp::Label {
            column: "maxscore",
            label_key: "column_max_score",
        },
    ],
};

static BADGES: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_BADGES,
    columns: &["id", "badgeid", "dateissued"],
    ops: &[
        ReportOp::Constant {
            column: "course",
            value: "",
        },
        ReportOp::Constant {
            column: "badge_name",
            value: "",
        },
        ReportOp::JoinFixed {
            table: "badge",
            key: "badgeid",
            mapping: &[("courseid", "course"), ("name", "badge_name")],
        },
        // Awards join first, then the course scope applies to the joined
        // course column (the award rows themselves carry no course).
        ReportOp::ConstrainToCourse { column: "course" },
        ReportOp::ReadableTime {
            label_key: "column_time",
            source: "dateissued",
        },
        ReportOp::Label {
            column: "badge_name",
            label_key: "column_badge_name",
        },
        ReportOp::Label {
            column: "course",
            label_key: "column_course",
        },
    ],
};

static CHATBOT_HISTORY: ReportDefinition = ReportDefinition {
    origin: &ORIGIN_CHATBOT,
    columns: &["id", "speaker", "message", "timecreated"],
    ops: &[
        ReportOp::ReadableTime {
            label_key: "column_time",
            source: "timecreated",
        },
        ReportOp::Label {
            column: "speaker",
            label_key: "column_speaker",
        },
        ReportOp::Label {
            column: "message",
            label_key: "column_message",
        },
    ],
};

/// Resolve the recipe for a report name.
pub fn definition(report: Report) -> &'static ReportDefinition {
    match report {
        Report::CourseLog => &COURSE_LOG,
        Report::CourseDedication => &COURSE_DEDICATION,
        Report::CourseModuleLog => &COURSE_MODULE_LOG,
        Report::CourseModuleDedication => &COURSE_MODULE_DEDICATION,
        Report::GradingInterest => &GRADING_INTEREST,
        Report::ForumActivity => &FORUM_ACTIVITY,
        Report::H5p => &H5P,
        Report::Badges => &BADGES,
        Report::ChatbotHistory => &CHATBOT_HISTORY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_report_has_a_definition() {
        for report in Report::all() {
            let def = definition(*report);
            assert!(!def.columns.is_empty());
            // Every projected column must be loadable from the origin.
            for column in def.columns {
                assert!(
                    def.origin.columns.contains(column),
                    "{} projects `{}` which origin `{}` does not load",
                    report,
                    column,
                    def.origin.table
                );
            }
        }
    }

    #[test]
    fn test_required_columns_are_loaded() {
        for report in Report::all() {
            let origin = definition(*report).origin;
            for required in origin.required {
                assert!(origin.columns.contains(required));
            }
        }
    }
}
