//! # Time Utilities
//!
//! Timestamps are exchanged as RFC3339 strings on the wire.

use chrono::{DateTime, Utc};

/// Format time as RFC3339 string.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

/// Milliseconds since the Unix epoch, used to build unique object keys.
pub fn timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}
