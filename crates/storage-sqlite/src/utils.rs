//! Shared column conversion helpers.

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 text timestamp column.
pub(crate) fn parse_ts(value: &Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp for an RFC 3339 text column.
pub(crate) fn fmt_ts(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}
