//! Dedication: session segmentation over time-ordered activity rows
//!
//! Rows arrive sorted ascending by their timestamp column. Consecutive rows
//! stay in one session while the gap between them is under the configured
//! maximum; a larger gap, or a change of the optional grouping key, closes
//! the session. Each closed session yields a dedication value of
//! `max(min_secs, last - first)` attached to the session's FIRST row, which
//! carries the session-start timestamp downstream formatting reads.
//!
//! Rows are scanned in batches of `batch_size`; the open-session state is
//! carried across batch edges, so a batch boundary can never split a
//! session.

use crate::config::DedicationConfig;
use crate::error::{Error, Result};
use crate::value::Row;

/// A closed session: the index of its representative (first) row and the
/// estimated seconds of dedication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSpan {
    pub row_index: usize,
    pub dedication_secs: i64,
}

#[derive(Debug)]
struct OpenSession {
    first_index: usize,
    start_time: i64,
    last_time: i64,
    group_key: Option<String>,
}

/// Incremental segmentation state machine.
///
/// `observe` one row at a time in timestamp order, then `finish` to close
/// the trailing session. Holding this struct across input chunks is what
/// keeps chunking invisible to the grouping.
#[derive(Debug, Default)]
struct SessionTracker {
    open: Option<OpenSession>,
    min_secs: i64,
    max_gap_secs: i64,
    sessions: Vec<SessionSpan>,
}

impl SessionTracker {
    fn new(config: &DedicationConfig) -> Self {
        Self {
            open: None,
            min_secs: config.min_secs,
            max_gap_secs: config.max_gap_secs,
            sessions: Vec::new(),
        }
    }

    fn observe(&mut self, index: usize, timestamp: i64, group_key: Option<String>) {
        match self.open.take() {
            None => {
                self.open = Some(OpenSession {
                    first_index: index,
                    start_time: timestamp,
                    last_time: timestamp,
                    group_key,
                });
            }
            Some(mut session) => {
                let within_gap = timestamp - session.last_time < self.max_gap_secs;
                let same_key = session.group_key == group_key;

                if within_gap && same_key {
                    session.last_time = timestamp;
                    self.open = Some(session);
                } else {
                    self.close(session);
                    self.open = Some(OpenSession {
                        first_index: index,
                        start_time: timestamp,
                        last_time: timestamp,
                        group_key,
                    });
                }
            }
        }
    }

    fn close(&mut self, session: OpenSession) {
        let elapsed = session.last_time - session.start_time;
        self.sessions.push(SessionSpan {
            row_index: session.first_index,
            dedication_secs: elapsed.max(self.min_secs),
        });
    }

    fn finish(mut self) -> Vec<SessionSpan> {
        if let Some(session) = self.open.take() {
            self.close(session);
        }
        self.sessions
    }
}

/// Segment `rows` into sessions.
///
/// `time_column` must exist on the rows (configuration error otherwise).
/// When `group_by` is given, rows only share a session while that column's
/// value is unchanged, in addition to the gap rule. Rows whose timestamp is
/// missing or non-numeric are skipped; origin loading requires the time
/// column non-empty, so this only arises on hand-built tables.
pub fn segment_sessions(
    rows: &[Row],
    time_column: &str,
    group_by: Option<&str>,
    config: &DedicationConfig,
) -> Result<Vec<SessionSpan>> {
    if let Some(first) = rows.first() {
        if !first.contains_key(time_column) {
            return Err(Error::ColumnNotFound {
                column: time_column.to_string(),
                operation: "dedication",
            });
        }
        if let Some(key_column) = group_by {
            if !first.contains_key(key_column) {
                return Err(Error::ColumnNotFound {
                    column: key_column.to_string(),
                    operation: "dedication",
                });
            }
        }
    }

    let mut tracker = SessionTracker::new(config);
    let mut index = 0usize;

    // Chunked scan; tracker state survives the chunk edge.
    for chunk in rows.chunks(config.batch_size.max(1)) {
        for row in chunk {
            let timestamp = match row.get(time_column).and_then(|v| v.as_i64()) {
                Some(ts) => ts,
                None => {
                    index += 1;
                    continue;
                }
            };
            let group_key = group_by
                .and_then(|column| row.get(column))
                .map(|v| v.key_string());

            tracker.observe(index, timestamp, group_key);
            index += 1;
        }
    }

    Ok(tracker.finish())
}
