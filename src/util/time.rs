//! Time formatting utilities.

use chrono::{DateTime, Utc};

/// Countdown label for a sub-account: `"Claude: in 5h (14:00)"` under a day,
/// `"Claude: in 3d (01/02)"` otherwise. Past resets count as zero hours.
#[must_use]
pub fn countdown_label(prefix: &str, reset: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = reset.signed_duration_since(now).num_hours().max(0);
    if hours < 24 {
        format!("{prefix}: in {hours}h ({})", reset.format("%H:%M"))
    } else {
        format!("{prefix}: in {}d ({})", hours / 24, reset.format("%m/%d"))
    }
}

/// Refresh label for a periodic quota: `"Monthly: in 12d (04/01)"`, or
/// `"Monthly: 04/01"` once less than a day remains.
#[must_use]
pub fn period_label(
    period: &str,
    reset: DateTime<Utc>,
    now: DateTime<Utc>,
    same_day_format: &str,
) -> String {
    let days = reset.signed_duration_since(now).num_days();
    if days > 0 {
        format!("{period}: in {days}d ({})", reset.format("%m/%d"))
    } else {
        format!("{period}: {}", reset.format(same_day_format))
    }
}

/// Parse an RFC 3339 timestamp into UTC.
#[must_use]
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
