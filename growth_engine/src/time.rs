//! Timestamp formatting and parsing helpers.
//!
//! All database writes are RFC-3339 UTC strings with millisecond precision;
//! freshness comparisons parse them back. Local times never enter the engine.

use chrono::{DateTime, Utc};

/// Format a UTC datetime as an RFC-3339 string with millisecond precision.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse an RFC-3339 timestamp (any offset) and convert it to UTC.
///
/// Returns `None` for malformed input; callers treat an unparseable stored
/// timestamp as stale rather than failing the request.
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
