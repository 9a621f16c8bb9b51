//! Staleness evaluation for cached entries.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::EdgeResponse;

/// Report whether `entry` is older than `max_age` at instant `now`.
///
/// An entry without a parseable capture timestamp is always stale, so
/// callers fall back to refetching.
pub fn is_stale(entry: &EdgeResponse, max_age: Duration, now: DateTime<Utc>) -> bool {
    let Some(captured_at) = entry.captured_at() else {
        return true;
    };
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return false;
    };
    now.signed_duration_since(captured_at) > max_age
}
