//! Time utilities for rdesk

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with millisecond precision,
/// e.g. `2024-05-01T12:00:00.123Z`
pub fn iso8601_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
