//! Error types for coursetrace-core

use thiserror::Error;

/// Main error type for the coursetrace-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A report definition referenced a column its source table does not have.
    ///
    /// This is a wiring bug in the report definition, not a data condition;
    /// it aborts generation of the affected report only.
    #[error("column `{column}` not found during {operation}")]
    ColumnNotFound {
        column: String,
        operation: &'static str,
    },

    /// Report name not in the registry
    #[error("unknown report: {0}")]
    UnknownReport(String),

    /// Raw table name not in the store schema
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

impl Error {
    /// Whether this error is a report wiring problem (as opposed to an
    /// environment failure). Callers use this to distinguish "fix the
    /// definition" from "retry / check the store".
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::ColumnNotFound { .. }
                | Error::UnknownReport(_)
                | Error::UnknownTable(_)
        )
    }
}

/// Result type alias for coursetrace-core
pub type Result<T> = std::result::Result<T, Error>;
