//! Timestamp freshness checking.
//!
//! Pure functions, no I/O. A malformed timestamp is a validation failure
//! (treated as not fresh), never a panic.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Maximum accepted skew between the signed timestamp and the current time.
pub fn default_tolerance() -> Duration {
    Duration::seconds(60)
}

/// Where a timestamp sits relative to the tolerance window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Future,
}

/// Parses a millisecond timestamp out of a credential field. Clients send it
/// either as a JSON number or as a numeric string.
pub fn parse_timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse::<f64>().ok().map(|float| float as i64),
        _ => None,
    }
}

/// Classifies `timestamp_millis` against `now`. Both window boundaries are
/// inclusive: a timestamp exactly `tolerance` away is still fresh.
pub fn check_freshness(timestamp_millis: i64, now: DateTime<Utc>, tolerance: Duration) -> Freshness {
    let diff = now.timestamp_millis().saturating_sub(timestamp_millis);
    let limit = tolerance.num_milliseconds();
    if diff > limit {
        Freshness::Stale
    } else if diff < -limit {
        Freshness::Future
    } else {
        Freshness::Fresh
    }
}

/// Accepts iff `-tolerance <= now - timestamp <= tolerance`.
pub fn is_fresh(timestamp_millis: i64, now: DateTime<Utc>, tolerance: Duration) -> bool {
    check_freshness(timestamp_millis, now, tolerance) == Freshness::Fresh
}
