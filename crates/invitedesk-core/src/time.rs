//! Canonical time handling.
//!
//! Every timestamp and day key in the system is taken in one configured
//! zone (the deployment runs in UTC+8), regardless of where the client
//! machine thinks it is. The [`Calendar`] is the single injected source of
//! "now" and "today"; the [`Clock`] trait underneath it makes
//! time-dependent behavior deterministic in tests.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

/// Offset of the canonical zone, in hours east of UTC.
pub const CANONICAL_OFFSET_HOURS: i32 = 8;

/// Abstraction over wall-clock time for testability.
///
/// In production, use [`SystemClock`]. In tests, use [`MockClock`] to
/// control time deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock that uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A mock clock for testing time-dependent code.
///
/// Starts at a given instant and only moves when advanced manually.
#[derive(Debug)]
pub struct MockClock {
    millis: AtomicI64,
}

impl MockClock {
    /// Creates a mock clock starting at the given instant.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        self.millis
            .fetch_add(duration.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default()
    }
}

/// The single source of "now" and "today" in the canonical zone.
#[derive(Clone)]
pub struct Calendar {
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl fmt::Debug for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calendar")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl Calendar {
    /// Creates a calendar over the given clock and zone offset.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { clock, offset }
    }

    /// Creates the production calendar: system clock, canonical zone.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), canonical_offset())
    }

    /// Returns the current instant in the canonical zone.
    #[must_use]
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now_utc().with_timezone(&self.offset)
    }

    /// Returns today's full day key (`YYYYMMDD`) in the canonical zone.
    #[must_use]
    pub fn today(&self) -> String {
        self.now().format("%Y%m%d").to_string()
    }

    /// Returns today's short day key (`MMDD`) in the canonical zone.
    ///
    /// The short key is the quota-bucketing dimension the backend stores.
    #[must_use]
    pub fn today_short(&self) -> String {
        self.now().format("%m%d").to_string()
    }

    /// Returns the current four-digit year in the canonical zone.
    #[must_use]
    pub fn year(&self) -> String {
        self.now().format("%Y").to_string()
    }
}

/// The canonical zone offset (UTC+8).
#[must_use]
#[allow(clippy::expect_used)] // +08:00 is always a valid offset
pub fn canonical_offset() -> FixedOffset {
    FixedOffset::east_opt(CANONICAL_OFFSET_HOURS * 3600).expect("valid fixed offset")
}

/// Normalizes a day key to the short `MMDD` form.
///
/// The backend accepts both `YYYYMMDD` and `MMDD` and compares on the
/// last four digits; listings and counts do the same.
#[must_use]
pub fn short_day_key(day: &str) -> &str {
    if day.len() > 4 {
        day.get(4..).unwrap_or(day)
    } else {
        day
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn today_uses_canonical_zone_not_utc() {
        // 20:00 UTC on March 1st is already March 2nd in UTC+8.
        let clock = MockClock::new(utc("2026-03-01T20:00:00Z"));
        let calendar = Calendar::new(Arc::new(clock), canonical_offset());

        assert_eq!(calendar.today(), "20260302");
        assert_eq!(calendar.today_short(), "0302");
        assert_eq!(calendar.year(), "2026");
    }

    #[test]
    fn mock_clock_advances() {
        let clock = MockClock::new(utc("2026-03-01T10:00:00Z"));
        let before = clock.now_utc();
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now_utc() - before, Duration::minutes(5));
    }

    #[test]
    fn short_day_key_truncates_full_keys() {
        assert_eq!(short_day_key("20260302"), "0302");
        assert_eq!(short_day_key("0302"), "0302");
    }
}
