//! Wall-clock helpers.

use chrono::{DateTime, TimeZone, Utc};

/// Current time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format epoch milliseconds as RFC 3339 in UTC.
///
/// Out-of-range timestamps fall back to the current time.
#[must_use]
pub fn iso_from_ms(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Whole seconds elapsed since `then`, clamped at zero for clock skew.
#[must_use]
pub fn age_secs(then: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from(now.signed_duration_since(then).num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn iso_round_trips_epoch() {
        assert_eq!(iso_from_ms(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(iso_from_ms(1_700_000_000_000), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn age_clamps_future_capture() {
        let now = Utc::now();
        assert_eq!(age_secs(now + Duration::seconds(30), now), 0);
        assert_eq!(age_secs(now - Duration::seconds(45), now), 45);
    }
}
