//! DT emission schedule.
//!
//! Maps wall-clock time onto emission days and periods, and derives how many
//! tokens are released per day, per period, and in total. Every function is
//! pure given the clock parameters.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

/// 2017-11-01 00:00:00 Beijing time, plus one nanosecond so that an exact
/// day boundary never lands on a whole day count.
pub static DEFAULT_EPOCH: Lazy<DateTime<Utc>> = Lazy::new(|| {
    DateTime::from_timestamp(1_509_465_600, 1).expect("epoch constant is in range")
});

pub const DEFAULT_BASE_RELEASE: f64 = 51_200.0;
pub const DEFAULT_DAMPING: f64 = 0.5;
pub const DEFAULT_PERIOD_DAYS: u32 = 365;

const SECS_PER_DAY: i64 = 86_400;

/// Emission bookkeeping for a single instant. Rebuilt wholesale on refresh.
///
/// The default value (day 0, everything zero) marks a market that has not
/// been refreshed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EmissionSnapshot {
    pub day: u32,
    pub period: u32,
    pub today_release: f64,
    pub total_release: f64,
}

#[derive(Debug, Clone)]
pub struct EmissionClock {
    epoch: DateTime<Utc>,
    base_release: f64,
    damping: f64,
    period_days: u32,
}

impl Default for EmissionClock {
    fn default() -> Self {
        Self::new(*DEFAULT_EPOCH, DEFAULT_BASE_RELEASE, DEFAULT_DAMPING, DEFAULT_PERIOD_DAYS)
    }
}

impl EmissionClock {
    /// `period_days` of zero is bumped to one so the period arithmetic
    /// never divides by zero.
    pub fn new(epoch: DateTime<Utc>, base_release: f64, damping: f64, period_days: u32) -> Self {
        Self {
            epoch,
            base_release,
            damping,
            period_days: period_days.max(1),
        }
    }

    /// Day number of `now`, counted from the epoch. A partially elapsed day
    /// counts as the next whole day. Instants at or before the epoch map
    /// to day 0.
    pub fn emission_day(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = now - self.epoch;
        if elapsed <= Duration::zero() {
            return 0;
        }
        let secs = elapsed.num_seconds();
        let subsec = elapsed - Duration::seconds(secs);
        let partial = secs % SECS_PER_DAY != 0 || subsec > Duration::zero();
        let day = secs / SECS_PER_DAY + i64::from(partial);
        u32::try_from(day).unwrap_or(u32::MAX)
    }

    pub fn emission_period(&self, day: u32) -> u32 {
        day.saturating_sub(1) / self.period_days + 1
    }

    /// Days released so far inside `period`, as seen from `day`.
    ///
    /// The last day of a period reports a full period rather than zero, and
    /// any period already completed by `day` is clamped to a full period.
    pub fn period_day_of_year(&self, day: u32, period: u32) -> u32 {
        if day == 0 {
            return 0;
        }
        if u64::from(day) > u64::from(period) * u64::from(self.period_days) {
            return self.period_days;
        }
        match day % self.period_days {
            0 => self.period_days,
            rest => rest,
        }
    }

    /// Flat per-day release for every day of `period`; halves each period
    /// with the default damping.
    pub fn daily_release(&self, period: u32) -> f64 {
        let exponent = i32::try_from(period.saturating_sub(1)).unwrap_or(i32::MAX);
        self.base_release * self.damping.powi(exponent)
    }

    pub fn period_release(&self, day: u32, period: u32) -> f64 {
        f64::from(self.period_day_of_year(day, period)) * self.daily_release(period)
    }

    /// Cumulative release from the epoch through `day`: every period up to
    /// `period` evaluated against the same `day`.
    pub fn total_release(&self, day: u32, period: u32) -> f64 {
        (1..=period).map(|p| self.period_release(day, p)).sum()
    }

    /// Emission state at `now`. Before the epoch nothing has been
    /// released, so the uninitialized default is returned.
    pub fn snapshot(&self, now: DateTime<Utc>) -> EmissionSnapshot {
        let day = self.emission_day(now);
        if day == 0 {
            return EmissionSnapshot::default();
        }
        let period = self.emission_period(day);
        EmissionSnapshot {
            day,
            period,
            today_release: self.daily_release(period),
            total_release: self.total_release(day, period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> EmissionClock {
        EmissionClock::default()
    }

    #[test]
    fn period_is_at_least_one_and_non_decreasing() {
        let c = clock();
        let mut last = c.emission_period(1);
        assert_eq!(last, 1);
        for day in 1..=2_000 {
            let p = c.emission_period(day);
            assert!(p >= 1);
            assert!(p >= last, "period went backwards at day {day}");
            last = p;
        }
    }

    #[test]
    fn period_boundaries() {
        let c = clock();
        assert_eq!(c.emission_period(365), 1);
        assert_eq!(c.emission_period(366), 2);
        assert_eq!(c.emission_period(730), 2);
        assert_eq!(c.emission_period(731), 3);
        assert_eq!(c.emission_period(0), 1);
    }

    #[test]
    fn daily_release_halves_each_period() {
        let c = clock();
        assert_eq!(c.daily_release(1), 51_200.0);
        assert_eq!(c.daily_release(2), 25_600.0);
        assert_eq!(c.daily_release(3), 12_800.0);
    }

    #[test]
    fn period_day_of_year_edges() {
        let c = clock();
        assert_eq!(c.period_day_of_year(365, 1), 365);
        assert_eq!(c.period_day_of_year(366, 2), 1);
        assert_eq!(c.period_day_of_year(42, 1), 42);
        // period 1 is complete by day 370
        assert_eq!(c.period_day_of_year(370, 1), 365);
        assert_eq!(c.period_day_of_year(0, 1), 0);
    }

    #[test]
    fn total_release_spans_completed_and_partial_periods() {
        let c = clock();
        let day = 370;
        let period = c.emission_period(day);
        assert_eq!(period, 2);

        let expected = c.period_release(day, 1) + c.period_release(day, 2);
        assert_eq!(c.total_release(day, period), expected);
        assert_eq!(expected, 365.0 * 51_200.0 + 5.0 * 25_600.0);
    }

    #[test]
    fn total_release_strictly_increases_within_a_period() {
        let c = clock();
        for period in 1..=3u32 {
            let first = (period - 1) * 365 + 1;
            let last = period * 365;
            let mut prev = c.total_release(first, period);
            for day in first + 1..=last {
                let next = c.total_release(day, period);
                assert!(next > prev, "not increasing at day {day}");
                prev = next;
            }
        }
    }

    #[test]
    fn partial_day_rounds_up() {
        let c = clock();
        let epoch = *DEFAULT_EPOCH;
        assert_eq!(c.emission_day(epoch), 0);
        assert_eq!(c.emission_day(epoch - Duration::hours(5)), 0);
        assert_eq!(c.emission_day(epoch + Duration::hours(1)), 1);
        assert_eq!(c.emission_day(epoch + Duration::hours(24)), 1);
        assert_eq!(c.emission_day(epoch + Duration::hours(25)), 2);
        assert_eq!(c.emission_day(epoch + Duration::hours(24) + Duration::nanoseconds(1)), 2);
    }

    #[test]
    fn nanosecond_past_boundary_rounds_up_far_from_epoch() {
        let c = clock();
        // 73_000 days in nanoseconds is well past f64's exact integer range
        let boundary = *DEFAULT_EPOCH + Duration::days(73_000);
        assert_eq!(c.emission_day(boundary), 73_000);
        assert_eq!(c.emission_day(boundary + Duration::nanoseconds(1)), 73_001);
    }

    #[test]
    fn snapshot_before_epoch_is_uninitialized() {
        let c = clock();
        let snap = c.snapshot(*DEFAULT_EPOCH - Duration::hours(5));
        assert_eq!(snap, EmissionSnapshot::default());
        assert_eq!(snap.today_release, 0.0);
        assert_eq!(c.snapshot(*DEFAULT_EPOCH), EmissionSnapshot::default());
    }

    #[test]
    fn snapshot_for_known_date() {
        let c = clock();
        // 2018-11-05 noon UTC is 369 days and 20 hours past the epoch
        let now = Utc.with_ymd_and_hms(2018, 11, 5, 12, 0, 0).unwrap();
        let snap = c.snapshot(now);
        assert_eq!(snap.day, 370);
        assert_eq!(snap.period, 2);
        assert_eq!(snap.today_release, 25_600.0);
        assert_eq!(snap.total_release, c.total_release(370, 2));
    }

    #[test]
    fn zero_period_length_is_clamped() {
        let c = EmissionClock::new(*DEFAULT_EPOCH, 100.0, 0.5, 0);
        assert_eq!(c.emission_period(3), 3);
        assert_eq!(c.period_day_of_year(3, 3), 1);
    }
}
