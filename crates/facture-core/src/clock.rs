//! # Clock
//!
//! Source of "now" for every timestamp and document number.
//!
//! Business code never calls `Utc::now()` directly; it receives a
//! `&dyn Clock`. Production wires [`SystemClock`], tests wire
//! [`FixedClock`] and move it by hand.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::sync::RwLock;

/// Provides the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for numbering (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use facture_core::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());
/// clock.advance(Duration::days(1));
/// assert_eq!(clock.today().to_string(), "2026-03-15");
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock {
            now: RwLock::new(now),
        }
    }

    /// Jumps to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = now;
    }

    /// Moves forward (or backward, with a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `[start of day, start of next day)` in UTC.
pub fn day_range(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// `[first day of month, first day of next month)` in UTC.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use facture_core::clock::month_range;
///
/// let (from, before) = month_range(NaiveDate::from_ymd_opt(2026, 12, 14).unwrap());
/// assert_eq!(from.to_rfc3339(), "2026-12-01T00:00:00+00:00");
/// assert_eq!(before.to_rfc3339(), "2027-01-01T00:00:00+00:00");
/// ```
pub fn month_range(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = date.with_day(1).unwrap_or(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .unwrap_or(first);

    (
        first.and_time(NaiveTime::MIN).and_utc(),
        next.and_time(NaiveTime::MIN).and_utc(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_stands_still() {
        let t = Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 0).unwrap();
        let clock = FixedClock::new(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), t);
    }

    #[test]
    fn test_fixed_clock_advance_crosses_midnight() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 0).unwrap());
        clock.advance(Duration::minutes(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[test]
    fn test_day_range() {
        let (start, end) = day_range(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_range() {
        let (from, before) = month_range(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(before, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());

        let (from, before) = month_range(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(before, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
