//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Creates a timestamp from Unix seconds, `None` when out of range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// First instant (00:00:00 UTC) of the given month, `None` for invalid input.
    pub fn start_of_month(year: i32, month: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single().map(Self)
    }

    /// Returns `later` unless it would move time backwards relative to `self`.
    ///
    /// Keeps lifecycle timestamps monotonic when a wall clock steps back.
    pub fn not_before(self, later: Timestamp) -> Timestamp {
        if later.is_before(&self) {
            self
        } else {
            later
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn start_of_month_rejects_invalid_month() {
        assert!(Timestamp::start_of_month(2030, 13).is_none());
        assert!(Timestamp::start_of_month(2030, 0).is_none());
    }

    #[test]
    fn start_of_month_is_first_day_midnight() {
        let ts = Timestamp::start_of_month(2031, 2).unwrap();
        assert_eq!(ts.as_datetime().day(), 1);
        assert_eq!(ts.as_datetime().month(), 2);
        assert_eq!(ts.as_unix_secs() % 86_400, 0);
    }

    #[test]
    fn not_before_keeps_later_value() {
        let earlier = Timestamp::now();
        let later = earlier.plus_secs(10);
        assert_eq!(earlier.not_before(later), later);
        assert_eq!(later.not_before(earlier), later);
    }

    #[test]
    fn unix_seconds_round_trip() {
        let ts = Timestamp::from_unix_secs(1_700_000_000).unwrap();
        assert_eq!(ts.as_unix_secs(), 1_700_000_000);
    }
}
