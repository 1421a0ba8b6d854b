//! Activity store schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//!
//! The store mirrors the raw tables of the hosting platform: the standard
//! activity log plus the auxiliary sources (H5P attempts, badge awards,
//! chatbot history) and the lookup tables joins resolve against.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Raw table names together with their column sets. Every identifier that
/// reaches dynamically-built SQL is validated against this list first.
pub const KNOWN_TABLES: &[(&str, &[&str])] = &[
    (
        "activity_log",
        &[
            "id",
            "eventname",
            "component",
            "action",
            "target",
            "objecttable",
            "objectid",
            "contextlevel",
            "contextinstanceid",
            "userid",
            "courseid",
            "timecreated",
            "other",
        ],
    ),
    (
        "h5p_attempts",
        &[
            "id",
            "userid",
            "courseid",
            "activityid",
            "interactiontype",
            "rawscore",
            "maxscore",
            "timecreated",
        ],
    ),
    ("badge_awards", &["id", "badgeid", "userid", "dateissued"]),
    ("badge", &["id", "courseid", "name"]),
    (
        "chatbot_log",
        &["id", "userid", "courseid", "speaker", "message", "timecreated"],
    ),
    (
        "course_modules",
        &["id", "courseid", "module", "instance", "section"],
    ),
    ("modules", &["id", "name"]),
    ("book_chapters", &["id", "bookid", "title"]),
    ("forum_discussions", &["id", "courseid", "name"]),
];

/// Look up the declared column set for a raw table.
pub fn table_columns(table: &str) -> Option<&'static [&'static str]> {
    KNOWN_TABLES
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, cols)| *cols)
}

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Raw activity sources
    -- ============================================

    CREATE TABLE IF NOT EXISTS activity_log (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        eventname         TEXT NOT NULL,
        component         TEXT NOT NULL,
        action            TEXT NOT NULL,
        target            TEXT,
        objecttable       TEXT,
        objectid          INTEGER,
        contextlevel      INTEGER NOT NULL,
        contextinstanceid INTEGER,
        userid            INTEGER NOT NULL,
        courseid          INTEGER NOT NULL,
        timecreated       INTEGER NOT NULL,
        other             JSON
    );

    CREATE TABLE IF NOT EXISTS h5p_attempts (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        userid           INTEGER NOT NULL,
        courseid         INTEGER NOT NULL,
        activityid       INTEGER NOT NULL,
        interactiontype  TEXT,
        rawscore         INTEGER,
        maxscore         INTEGER,
        timecreated      INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS badge_awards (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        badgeid          INTEGER NOT NULL,
        userid           INTEGER NOT NULL,
        dateissued       INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chatbot_log (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        userid           INTEGER NOT NULL,
        courseid         INTEGER NOT NULL,
        speaker          TEXT NOT NULL,
        message          TEXT,
        timecreated      INTEGER NOT NULL
    );

    -- ============================================
    -- Lookup tables joins resolve against
    -- ============================================

    CREATE TABLE IF NOT EXISTS badge (
        id               INTEGER PRIMARY KEY,
        courseid         INTEGER,
        name             TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS course_modules (
        id               INTEGER PRIMARY KEY,
        courseid         INTEGER NOT NULL,
        module           INTEGER NOT NULL,
        instance         INTEGER NOT NULL,
        section          INTEGER
    );

    CREATE TABLE IF NOT EXISTS modules (
        id               INTEGER PRIMARY KEY,
        name             TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS book_chapters (
        id               INTEGER PRIMARY KEY,
        bookid           INTEGER,
        title            TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS forum_discussions (
        id               INTEGER PRIMARY KEY,
        courseid         INTEGER,
        name             TEXT NOT NULL
    );

    -- ============================================
    -- Indexes
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_log_user_course ON activity_log(userid, courseid);
    CREATE INDEX IF NOT EXISTS idx_log_time ON activity_log(timecreated);
    CREATE INDEX IF NOT EXISTS idx_h5p_user_course ON h5p_attempts(userid, courseid);
    CREATE INDEX IF NOT EXISTS idx_badge_awards_user ON badge_awards(userid);
    CREATE INDEX IF NOT EXISTS idx_chatbot_user_course ON chatbot_log(userid, courseid);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking store migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Get the current schema version from the store
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
