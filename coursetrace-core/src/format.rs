//! Formatting helpers shared across reports and UIs.

use chrono::{DateTime, Local, Utc};

/// Format an epoch-seconds timestamp as a local, human-readable date-time
/// (e.g., "Tue, 3 Jun 2025, 14:05"). This is what `with_readable_time`
/// writes into report tables.
pub fn format_epoch_seconds(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%a, %-d %b %Y, %H:%M")
            .to_string(),
        None => String::new(),
    }
}

/// Format a dedication value (seconds) as "1h 5m 30s", dropping zero units
/// from the left.
pub fn format_duration_secs(secs: i64) -> String {
    let secs = secs.max(0);
    let (h, rem) = (secs / 3600, secs % 3600);
    let (m, s) = (rem / 60, rem % 60);

    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_secs(45), "45s");
        assert_eq!(format_duration_secs(90), "1m 30s");
        assert_eq!(format_duration_secs(3700), "1h 1m 40s");
        assert_eq!(format_duration_secs(-5), "0s");
    }

    #[test]
    fn test_format_epoch_out_of_range() {
        assert_eq!(format_epoch_seconds(i64::MAX), "");
    }
}
