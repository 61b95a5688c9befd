//! Unlock evaluation: locked/unlocked status and the countdown.
//!
//! Status is never stored. Every read path calls [`evaluate`] with the
//! current instant, so a capsule flips to unlocked the moment `now` reaches
//! its unlock date and never flips back.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::errors::CapsuleError;
use crate::ports::Clock;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Derived visibility state of a capsule.
///
/// The only transition is `Locked -> Unlocked`, once `now >= unlock_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockStatus {
    Locked,
    Unlocked,
}

/// Whole days, hours and minutes left until unlock.
///
/// Seconds are truncated, so the breakdown never overstates the real wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub days: u64,
    pub hours: u32,
    pub minutes: u32,
}

impl TimeRemaining {
    /// Break a duration down into days / hours (0-23) / minutes (0-59).
    ///
    /// Negative durations collapse to zero.
    pub fn from_duration(remaining: TimeDelta) -> Self {
        let total = remaining.num_seconds().max(0);
        let days = total / SECS_PER_DAY;
        let rest = total % SECS_PER_DAY;
        Self {
            days: days as u64,
            hours: (rest / SECS_PER_HOUR) as u32,
            minutes: ((rest % SECS_PER_HOUR) / SECS_PER_MINUTE) as u32,
        }
    }

    /// The duration this breakdown represents.
    pub fn as_duration(&self) -> TimeDelta {
        TimeDelta::days(self.days as i64)
            + TimeDelta::hours(i64::from(self.hours))
            + TimeDelta::minutes(i64::from(self.minutes))
    }
}

/// Result of evaluating one capsule at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub status: UnlockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<TimeRemaining>,
}

impl Evaluation {
    pub fn unlocked() -> Self {
        Self {
            status: UnlockStatus::Unlocked,
            time_remaining: None,
        }
    }

    pub fn locked(remaining: TimeRemaining) -> Self {
        Self {
            status: UnlockStatus::Locked,
            time_remaining: Some(remaining),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.status == UnlockStatus::Unlocked
    }
}

/// Classify a capsule as locked or unlocked at `now`.
///
/// The boundary is inclusive: `now == unlock_date` is unlocked.
pub fn evaluate(unlock_date: DateTime<Utc>, now: DateTime<Utc>) -> Evaluation {
    if now >= unlock_date {
        return Evaluation::unlocked();
    }
    Evaluation::locked(TimeRemaining::from_duration(unlock_date - now))
}

/// [`evaluate`] against the clock's current instant.
pub fn evaluate_now<C: Clock + ?Sized>(clock: &C, unlock_date: DateTime<Utc>) -> Evaluation {
    evaluate(unlock_date, clock.now())
}

/// Parse a user supplied unlock date.
///
/// Accepted forms:
/// - RFC 3339 with an offset or `Z` (`2030-01-01T09:00:00+09:00`)
/// - naive date-time, taken as UTC (`2030-01-01T00:00:00.250`, `2030-01-01T00:00`)
/// - bare date, taken as UTC midnight (`2030-01-01`)
pub fn parse_unlock_date(input: &str) -> Result<DateTime<Utc>, CapsuleError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(CapsuleError::invalid("Missing required field: unlock_date"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    Err(CapsuleError::invalid(
        "Invalid unlock_date format. Use ISO 8601 format.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::TimeZone;
    use rstest::rstest;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
    }

    #[test]
    fn boundary_is_inclusive() {
        let e = evaluate(t0(), t0());
        assert_eq!(e.status, UnlockStatus::Unlocked);
        assert!(e.time_remaining.is_none());
    }

    #[rstest]
    #[case(TimeDelta::seconds(1))]
    #[case(TimeDelta::days(1))]
    #[case(TimeDelta::days(365 * 40))]
    fn past_unlock_date_is_unlocked_without_countdown(#[case] past_by: TimeDelta) {
        let e = evaluate(t0(), t0() + past_by);
        assert_eq!(e, Evaluation::unlocked());
    }

    #[rstest]
    #[case(TimeDelta::minutes(90), 0, 1, 30)]
    #[case(TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(10), 2, 3, 10)]
    #[case(TimeDelta::seconds(59), 0, 0, 0)]
    #[case(TimeDelta::seconds(61), 0, 0, 1)]
    #[case(TimeDelta::hours(24) - TimeDelta::milliseconds(1), 0, 23, 59)]
    #[case(TimeDelta::days(30), 30, 0, 0)]
    fn locked_breakdown(
        #[case] ahead_by: TimeDelta,
        #[case] days: u64,
        #[case] hours: u32,
        #[case] minutes: u32,
    ) {
        let e = evaluate(t0() + ahead_by, t0());
        assert_eq!(e.status, UnlockStatus::Locked);
        assert_eq!(
            e.time_remaining,
            Some(TimeRemaining {
                days,
                hours,
                minutes
            })
        );
    }

    #[test]
    fn breakdown_is_truncated_and_within_one_minute() {
        let unlock = t0();
        let mut offset = 1i64;
        while offset < 10 * SECS_PER_DAY {
            let now = unlock - TimeDelta::seconds(offset);
            let remaining = evaluate(unlock, now).time_remaining.unwrap();
            let rebuilt = remaining.as_duration();
            let truth = unlock - now;

            assert!(rebuilt <= truth, "overstated at offset {offset}");
            assert!(truth - rebuilt < TimeDelta::minutes(1));
            assert!(remaining.hours < 24);
            assert!(remaining.minutes < 60);

            offset = offset * 3 + 7;
        }
    }

    #[test]
    fn status_is_monotonic_in_now() {
        let unlock = t0();
        let mut seen_locked = false;
        for step in (-120..=120).rev() {
            let now = unlock + TimeDelta::seconds(step);
            let e = evaluate(unlock, now);
            if e.status == UnlockStatus::Locked {
                seen_locked = true;
            } else {
                assert!(!seen_locked, "unlocked again after being locked at step {step}");
            }
        }
        assert!(seen_locked);
    }

    #[test]
    fn evaluate_is_pure() {
        let unlock = t0() + TimeDelta::hours(5);
        assert_eq!(evaluate(unlock, t0()), evaluate(unlock, t0()));
    }

    #[test]
    fn evaluate_now_reads_the_clock() {
        let clock = FixedClock::new(t0());
        let unlock = t0() + TimeDelta::minutes(5);

        assert_eq!(evaluate_now(&clock, unlock).status, UnlockStatus::Locked);
        clock.advance(TimeDelta::minutes(5));
        assert_eq!(evaluate_now(&clock, unlock).status, UnlockStatus::Unlocked);
    }

    #[test]
    fn negative_duration_collapses_to_zero() {
        let r = TimeRemaining::from_duration(TimeDelta::minutes(-3));
        assert_eq!(
            r,
            TimeRemaining {
                days: 0,
                hours: 0,
                minutes: 0
            }
        );
    }

    #[test]
    fn locked_evaluation_serializes_status_lowercase() {
        let e = evaluate(t0() + TimeDelta::minutes(90), t0());
        let json = serde_json::to_value(e).unwrap();
        assert_eq!(json["status"], "locked");
        assert_eq!(json["time_remaining"]["hours"], 1);

        let json = serde_json::to_value(Evaluation::unlocked()).unwrap();
        assert_eq!(json["status"], "unlocked");
        assert!(json.get("time_remaining").is_none());
    }

    #[rstest]
    #[case("2030-01-01T00:00:00Z", Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())]
    #[case("2030-01-01T09:00:00+09:00", Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())]
    #[case("2030-01-01T00:00:00.000Z", Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())]
    #[case("2030-01-01T12:30:45", Utc.with_ymd_and_hms(2030, 1, 1, 12, 30, 45).unwrap())]
    #[case("2030-01-01T12:30", Utc.with_ymd_and_hms(2030, 1, 1, 12, 30, 0).unwrap())]
    #[case("2030-01-01", Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())]
    #[case("  2030-01-01  ", Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())]
    fn parses_supported_formats(#[case] input: &str, #[case] expected: DateTime<Utc>) {
        assert_eq!(parse_unlock_date(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("tomorrow")]
    #[case("2030-13-01")]
    #[case("01/02/2030")]
    fn rejects_malformed_dates(#[case] input: &str) {
        let err = parse_unlock_date(input).unwrap_err();
        assert!(matches!(err, CapsuleError::InvalidInput(_)));
    }
}
