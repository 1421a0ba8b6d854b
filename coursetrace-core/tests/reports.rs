//! Integration tests for the report pipeline
//!
//! These seed an in-memory activity store with one user's activity in one
//! course (plus noise from other users and courses) and drive every built-in
//! report end-to-end through the generator.

use coursetrace_core::report::ReportTable;
use coursetrace_core::{
    ActivityStore, Config, EnglishLabels, Report, ReportGenerator, ReportScope, Row, Value,
};

const USER: i64 = 1;
const COURSE: i64 = 10;

fn scope() -> ReportScope {
    ReportScope::new(USER, COURSE)
}

#[allow(clippy::too_many_arguments)]
fn log_event(
    store: &ActivityStore,
    userid: i64,
    courseid: i64,
    time: i64,
    eventname: &str,
    component: &str,
    action: &str,
    target: &str,
    object: Option<(&str, i64)>,
    context: (i64, Option<i64>),
) {
    let mut fields: Vec<(&str, Value)> = vec![
        ("eventname", eventname.into()),
        ("component", component.into()),
        ("action", action.into()),
        ("target", target.into()),
        ("contextlevel", Value::Int(context.0)),
        ("userid", Value::Int(userid)),
        ("courseid", Value::Int(courseid)),
        ("timecreated", Value::Int(time)),
    ];
    if let Some((table, id)) = object {
        fields.push(("objecttable", table.into()));
        fields.push(("objectid", Value::Int(id)));
    }
    if let Some(instance) = context.1 {
        fields.push(("contextinstanceid", Value::Int(instance)));
    }
    store.insert_row("activity_log", &fields).expect("log event");
}

/// One user's plausible pass through a course, plus noise rows the scope
/// filters must exclude.
fn seeded_store() -> ActivityStore {
    let store = ActivityStore::open_in_memory().expect("open store");
    store.migrate().expect("migrate");

    // Session one: course view, grade report, book chapter (0..100).
    log_event(
        &store,
        USER,
        COURSE,
        0,
        "\\core\\event\\course_viewed",
        "core",
        "viewed",
        "course",
        None,
        (50, None),
    );
    log_event(
        &store,
        USER,
        COURSE,
        30,
        "\\gradereport_user\\event\\grade_report_viewed",
        "gradereport_user",
        "viewed",
        "grade_report",
        None,
        (50, None),
    );
    log_event(
        &store,
        USER,
        COURSE,
        100,
        "\\mod_book\\event\\chapter_viewed",
        "mod_book",
        "viewed",
        "chapter",
        Some(("book_chapters", 5)),
        (70, Some(200)),
    );

    // Session two after a 1100s gap: forum activity (1200..1250).
    log_event(
        &store,
        USER,
        COURSE,
        1200,
        "\\mod_forum\\event\\discussion_viewed",
        "mod_forum",
        "viewed",
        "discussion",
        Some(("forum_discussions", 9)),
        (70, Some(201)),
    );
    log_event(
        &store,
        USER,
        COURSE,
        1250,
        "\\mod_forum\\event\\post_created",
        "mod_forum",
        "created",
        "post",
        Some(("forum_posts", 77)),
        (70, Some(201)),
    );

    // Noise: another user, another course.
    log_event(
        &store,
        2,
        COURSE,
        50,
        "\\core\\event\\course_viewed",
        "core",
        "viewed",
        "course",
        None,
        (50, None),
    );
    log_event(
        &store,
        USER,
        11,
        60,
        "\\core\\event\\course_viewed",
        "core",
        "viewed",
        "course",
        None,
        (50, None),
    );

    // Lookup tables for joins.
    store
        .insert_row(
            "book_chapters",
            &[("id", Value::Int(5)), ("bookid", Value::Int(1)), ("title", "Intro".into())],
        )
        .unwrap();
    store
        .insert_row(
            "forum_discussions",
            &[
                ("id", Value::Int(9)),
                ("courseid", Value::Int(COURSE)),
                ("name", "Week 1".into()),
            ],
        )
        .unwrap();
    store
        .insert_row(
            "course_modules",
            &[
                ("id", Value::Int(200)),
                ("courseid", Value::Int(COURSE)),
                ("module", Value::Int(3)),
                ("instance", Value::Int(1)),
            ],
        )
        .unwrap();
    store
        .insert_row(
            "course_modules",
            &[
                ("id", Value::Int(201)),
                ("courseid", Value::Int(COURSE)),
                ("module", Value::Int(4)),
                ("instance", Value::Int(2)),
            ],
        )
        .unwrap();
    store
        .insert_row("modules", &[("id", Value::Int(3)), ("name", "book".into())])
        .unwrap();
    store
        .insert_row("modules", &[("id", Value::Int(4)), ("name", "forum".into())])
        .unwrap();

    // Badges: 7 is in this course, 8 has no badge record at all, 9 belongs
    // to another course.
    for (badgeid, dateissued) in [(7, 500), (8, 600), (9, 700)] {
        store
            .insert_row(
                "badge_awards",
                &[
                    ("badgeid", Value::Int(badgeid)),
                    ("userid", Value::Int(USER)),
                    ("dateissued", Value::Int(dateissued)),
                ],
            )
            .unwrap();
    }
    store
        .insert_row(
            "badge",
            &[("id", Value::Int(7)), ("courseid", Value::Int(COURSE)), ("name", "X".into())],
        )
        .unwrap();
    store
        .insert_row(
            "badge",
            &[("id", Value::Int(9)), ("courseid", Value::Int(11)), ("name", "Other".into())],
        )
        .unwrap();

    // H5P attempts.
    for (time, kind, raw, max) in [(300, "choice", 1, 2), (320, "true-false", 2, 2)] {
        store
            .insert_row(
                "h5p_attempts",
                &[
                    ("userid", Value::Int(USER)),
                    ("courseid", Value::Int(COURSE)),
                    ("activityid", Value::Int(1)),
                    ("interactiontype", kind.into()),
                    ("rawscore", Value::Int(raw)),
                    ("maxscore", Value::Int(max)),
                    ("timecreated", Value::Int(time)),
                ],
            )
            .unwrap();
    }

    // Chatbot exchange.
    for (time, speaker, message) in [(400, "user", "когда экзамен?"), (401, "bot", "June 3rd")] {
        store
            .insert_row(
                "chatbot_log",
                &[
                    ("userid", Value::Int(USER)),
                    ("courseid", Value::Int(COURSE)),
                    ("speaker", speaker.into()),
                    ("message", message.into()),
                    ("timecreated", Value::Int(time)),
                ],
            )
            .unwrap();
    }

    store
}

fn generate(store: &ActivityStore, report: Report) -> ReportTable {
    let labels = EnglishLabels::new();
    let config = Config::default();
    let mut generator = ReportGenerator::new(store, &labels, &config);
    generator.generate(report, scope()).expect("generate report")
}

fn text(row: &Row, column: &str) -> String {
    row.get(column).map(|v| v.to_string()).unwrap_or_default()
}

#[test]
fn course_log_scopes_and_labels() {
    let store = seeded_store();
    let table = generate(&store, Report::CourseLog);

    assert_eq!(table.len(), 5, "only the scoped user's course rows");
    assert_eq!(
        table.columns(),
        ["id", "Event", "Component", "Action", "Target", "timecreated", "Time"]
    );

    // Rows come back ascending by time, formatted timestamps present.
    let first = &table.rows()[0];
    assert_eq!(text(first, "Component"), "core");
    assert!(!text(first, "Time").is_empty());
}

#[test]
fn course_dedication_segments_sessions() {
    let store = seeded_store();
    let table = generate(&store, Report::CourseDedication);

    // Events at 0, 30, 100, 1200, 1250 with a 900s gap limit: two sessions.
    assert_eq!(table.len(), 2);

    let dedications: Vec<i64> = table
        .rows()
        .iter()
        .map(|r| r.get("Dedication (s)").and_then(|v| v.as_i64()).unwrap())
        .collect();
    assert_eq!(dedications, vec![100, 60], "max(60,100-0) then max(60,50)");

    // Representative rows carry the session-start timestamps.
    let starts: Vec<i64> = table
        .rows()
        .iter()
        .map(|r| r.get("timecreated").and_then(|v| v.as_i64()).unwrap())
        .collect();
    assert_eq!(starts, vec![0, 1200]);
    assert!(table.columns().contains(&"Session start".to_string()));
}

#[test]
fn course_module_log_resolves_object_names() {
    let store = seeded_store();
    let table = generate(&store, Report::CourseModuleLog);

    assert_eq!(table.len(), 3, "module-context rows only");

    let names: Vec<String> = table
        .rows()
        .iter()
        .map(|r| text(r, "Object name"))
        .collect();
    // book_chapters and forum_discussions resolve; forum_posts has no
    // dispatch entry and keeps the declared default.
    assert_eq!(names, vec!["Intro", "Week 1", ""]);
}

#[test]
fn course_module_dedication_groups_by_module() {
    let store = seeded_store();
    let table = generate(&store, Report::CourseModuleDedication);

    assert_eq!(table.len(), 2, "one session per module run");

    let rows = table.rows();
    assert_eq!(text(&rows[0], "Module"), "book");
    assert_eq!(
        rows[0].get("Dedication (s)").and_then(|v| v.as_i64()),
        Some(60),
        "lone chapter view hits the floor"
    );
    assert_eq!(text(&rows[1], "Module"), "forum");
    assert_eq!(
        rows[1].get("Dedication (s)").and_then(|v| v.as_i64()),
        Some(60),
        "max(60, 1250-1200)"
    );
}

#[test]
fn grading_interest_is_grade_report_views_only() {
    let store = seeded_store();
    let table = generate(&store, Report::GradingInterest);

    assert_eq!(table.len(), 1);
    assert_eq!(text(&table.rows()[0], "Target"), "grade_report");
}

#[test]
fn forum_activity_resolves_discussions() {
    let store = seeded_store();
    let table = generate(&store, Report::ForumActivity);

    assert_eq!(table.len(), 2);
    let names: Vec<String> = table
        .rows()
        .iter()
        .map(|r| text(r, "Object name"))
        .collect();
    assert_eq!(names, vec!["Week 1", ""]);
}

#[test]
fn h5p_report_carries_scores() {
    let store = seeded_store();
    let table = generate(&store, Report::H5p);

    assert_eq!(table.len(), 2);
    let first = &table.rows()[0];
    assert_eq!(text(first, "Interaction"), "choice");
    assert_eq!(first.get("Score").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(first.get("Max score").and_then(|v| v.as_i64()), Some(2));
}

#[test]
fn badges_join_and_scope_to_course() {
    let store = seeded_store();
    let table = generate(&store, Report::Badges);

    // Badge 8 resolves to nothing (defaults, then dropped by the course
    // constraint); badge 9 belongs to another course.
    assert_eq!(table.len(), 1);
    let row = &table.rows()[0];
    assert_eq!(text(row, "Badge"), "X");
    assert_eq!(row.get("Course").and_then(|v| v.as_i64()), Some(COURSE));
}

#[test]
fn chatbot_history_round_trips_messages() {
    let store = seeded_store();
    let table = generate(&store, Report::ChatbotHistory);

    assert_eq!(table.len(), 2);
    assert_eq!(text(&table.rows()[0], "Speaker"), "user");
    assert_eq!(text(&table.rows()[1], "Message"), "June 3rd");
}

#[test]
fn empty_sources_yield_empty_reports_not_errors() {
    let store = seeded_store();
    let labels = EnglishLabels::new();
    let config = Config::default();
    let mut generator = ReportGenerator::new(&store, &labels, &config);
    let nobody = ReportScope::new(99, COURSE);

    for report in Report::all() {
        let table = generator
            .generate(*report, nobody)
            .unwrap_or_else(|e| panic!("{} should not fail on empty data: {}", report, e));
        assert!(table.is_empty(), "{} should be empty", report);
    }
}

#[test]
fn all_reports_share_one_generator_pass() {
    let store = seeded_store();
    let labels = EnglishLabels::new();
    let config = Config::default();
    let mut generator = ReportGenerator::new(&store, &labels, &config);

    // The six log-backed reports reuse one cached origin; generating the
    // full set through one generator must stay consistent.
    for report in Report::all() {
        let table = generator.generate(*report, scope()).expect("generate");
        if *report != Report::GradingInterest {
            continue;
        }
        assert_eq!(table.len(), 1);
    }
}

#[test]
fn fixed_join_miss_keeps_declared_defaults() {
    let store = seeded_store();

    // Hand-built table: one resolvable badge id and one unknown.
    let mut hit = Row::new();
    hit.insert("badgeid".to_string(), Value::Int(7));
    let mut miss = Row::new();
    miss.insert("badgeid".to_string(), Value::Int(404));

    let config = Config::default();
    let table = ReportTable::new(vec!["badgeid".into()], vec![hit, miss])
        .with_constant("course", Value::Text(String::new()))
        .with_constant("badge_name", Value::Text(String::new()))
        .join_fixed(
            &store,
            "badge",
            "badgeid",
            &[("courseid", "course"), ("name", "badge_name")],
            &config.joins,
        )
        .expect("join");

    let rows = table.rows();
    assert_eq!(rows[0].get("course").and_then(|v| v.as_i64()), Some(COURSE));
    assert_eq!(text(&rows[0], "badge_name"), "X");
    assert_eq!(text(&rows[1], "course"), "", "miss keeps the placeholder");
    assert_eq!(text(&rows[1], "badge_name"), "");
}

#[test]
fn store_opens_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("activity.db");
    let store = ActivityStore::open(&path).expect("open on disk");
    store.migrate().expect("migrate");
    assert_eq!(store.count("activity_log").expect("count"), 0);
}
