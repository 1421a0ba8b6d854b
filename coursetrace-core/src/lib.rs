//! # coursetrace-core
//!
//! Core library for coursetrace - course activity reporting with dedication
//! analytics.
//!
//! This library provides:
//! - An SQLite activity store holding the raw course activity sources
//! - An origin-table loader with per-request caching
//! - A chainable report-table pipeline (projection, constraints, joins,
//!   constants, time formatting, renames)
//! - Dedication: session segmentation estimating time-on-task
//! - Declarative definitions for the built-in reports
//!
//! ## Architecture
//!
//! Raw records flow one way per request:
//! - **Origin tables:** fetched once per source table and cached
//! - **Report tables:** derived per report by a fixed operation sequence;
//!   never persisted
//!
//! ## Example
//!
//! ```rust,no_run
//! use coursetrace_core::{ActivityStore, Config, EnglishLabels, Report, ReportGenerator, ReportScope};
//!
//! let config = Config::load().expect("failed to load config");
//! let store = ActivityStore::open(&config.store_path()).expect("failed to open store");
//! store.migrate().expect("failed to run migrations");
//!
//! let labels = EnglishLabels::new();
//! let mut generator = ReportGenerator::new(&store, &labels, &config);
//! let table = generator
//!     .generate(Report::CourseDedication, ReportScope::new(1, 10))
//!     .expect("report generation failed");
//! println!("{} sessions", table.len());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use report::{
    EnglishLabels, LabelProvider, Report, ReportGenerator, ReportScope, ReportTable,
};
pub use store::{ActivityStore, FieldFilter, RecordSource};
pub use value::{Row, Value};

// Public modules
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod report;
pub mod store;
pub mod value;
