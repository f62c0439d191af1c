//! Office-hours evaluation in the office's own time zone.
//!
//! Precedence for a local calendar date:
//! 1. any non-workday exception closes the whole date
//! 2. otherwise workday exceptions, when present, fully replace the weekly rules
//! 3. otherwise the weekly rules for the local weekday apply; no rule means closed
//!
//! Intervals are half-open `[start, end)` and intervals with `start >= end`
//! are skipped.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use super::types::{Interval, Schedule};

/// The resolved working plan for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayPlan {
    /// An explicit non-workday exception closes the date.
    Closed,
    /// Workday exceptions govern the date exclusively.
    Exceptions(Vec<Interval>),
    /// No exceptions; the weekly rules for the weekday apply.
    Weekly(Vec<Interval>),
}

impl DayPlan {
    /// Open intervals of the date, in stored order.
    pub fn intervals(&self) -> &[Interval] {
        match self {
            DayPlan::Closed => &[],
            DayPlan::Exceptions(intervals) | DayPlan::Weekly(intervals) => intervals,
        }
    }

    /// Returns true if `time` falls in any interval of the plan.
    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        self.intervals().iter().any(|i| i.contains(time))
    }
}

/// Resolve which intervals apply to `date` under `schedule`.
pub fn plan_for_date(schedule: &Schedule, date: NaiveDate) -> DayPlan {
    let exceptions = schedule.exceptions_on(date);

    if !exceptions.is_empty() {
        if exceptions.iter().any(|e| !e.is_workday) {
            return DayPlan::Closed;
        }

        let intervals = exceptions
            .iter()
            .filter_map(|e| e.interval())
            .filter(|i| keep_interval(&schedule.id, i))
            .collect();
        return DayPlan::Exceptions(intervals);
    }

    let intervals = schedule
        .rules_for(date.weekday())
        .map(|r| r.interval())
        .filter(|i| keep_interval(&schedule.id, i))
        .collect();
    DayPlan::Weekly(intervals)
}

fn keep_interval(schedule_id: &str, interval: &Interval) -> bool {
    if interval.is_valid() {
        true
    } else {
        debug!(
            schedule_id,
            start = %interval.start,
            end = %interval.end,
            "Skipping schedule interval that does not end after it starts"
        );
        false
    }
}

/// Evaluates office hours against a schedule.
///
/// Holds the system zone used when an office has no usable zone of its own.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOracle {
    fallback_zone: Tz,
}

impl ScheduleOracle {
    /// Create an oracle that falls back to `fallback_zone`.
    pub fn new(fallback_zone: Tz) -> Self {
        Self { fallback_zone }
    }

    /// The configured system zone.
    pub fn fallback_zone(&self) -> Tz {
        self.fallback_zone
    }

    /// Resolve an IANA zone name, falling back to the system zone.
    ///
    /// Falling back is not an error; it is logged and evaluation proceeds.
    pub fn resolve_zone(&self, zone: Option<&str>) -> Tz {
        match zone.map(str::trim).filter(|z| !z.is_empty()) {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    warn!(
                        zone = name,
                        fallback = %self.fallback_zone,
                        "Unknown office time zone, falling back to system zone"
                    );
                    self.fallback_zone
                }
            },
            None => {
                warn!(
                    fallback = %self.fallback_zone,
                    "Office time zone not set, falling back to system zone"
                );
                self.fallback_zone
            }
        }
    }

    /// `at` expressed in the resolved office zone.
    pub fn local_time(&self, zone: Option<&str>, at: DateTime<Utc>) -> DateTime<Tz> {
        at.with_timezone(&self.resolve_zone(zone))
    }

    /// The office-local calendar date of `at`.
    pub fn local_date(&self, zone: Option<&str>, at: DateTime<Utc>) -> NaiveDate {
        self.local_time(zone, at).date_naive()
    }

    /// Returns true if the office is open at `at`.
    ///
    /// Pure in `(schedule, zone, at)` apart from logging.
    pub fn is_open(&self, schedule: &Schedule, zone: Option<&str>, at: DateTime<Utc>) -> bool {
        let local = self.local_time(zone, at);
        let plan = plan_for_date(schedule, local.date_naive());
        let open = plan.is_open_at(local.time());

        debug!(
            schedule_id = %schedule.id,
            local = %local,
            open,
            "Evaluated office hours"
        );
        open
    }

    /// Open intervals for a specific office-local calendar date.
    ///
    /// Same precedence as [`ScheduleOracle::is_open`]; a closed date yields no intervals.
    pub fn working_intervals_for_date(&self, schedule: &Schedule, date: NaiveDate) -> Vec<Interval> {
        plan_for_date(schedule, date).intervals().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DateException;
    use chrono::{TimeZone, Weekday};

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn oracle() -> ScheduleOracle {
        ScheduleOracle::new(chrono_tz::UTC)
    }

    // 2025-01-15 is a Wednesday.
    fn wed(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, h, m, s).unwrap()
    }

    fn wednesday_morning() -> Schedule {
        Schedule::new("morning").with_rule(Weekday::Wed, t(9, 0, 0), t(13, 0, 0))
    }

    #[test]
    fn test_boundaries_are_half_open() {
        let schedule = wednesday_morning();
        let oracle = oracle();
        let zone = Some("UTC");

        assert!(!oracle.is_open(&schedule, zone, wed(8, 59, 59)));
        assert!(oracle.is_open(&schedule, zone, wed(9, 0, 0)));
        assert!(oracle.is_open(&schedule, zone, wed(12, 59, 59)));
        assert!(!oracle.is_open(&schedule, zone, wed(13, 0, 0)));
    }

    #[test]
    fn test_no_rule_for_weekday_is_closed() {
        let schedule = wednesday_morning();
        // 2025-01-16 is a Thursday.
        let thursday = Utc.with_ymd_and_hms(2025, 1, 16, 10, 0, 0).unwrap();
        assert!(!oracle().is_open(&schedule, Some("UTC"), thursday));
    }

    #[test]
    fn test_split_shifts_are_checked_independently() {
        let schedule = Schedule::new("split")
            .with_rule(Weekday::Wed, t(9, 0, 0), t(12, 0, 0))
            .with_rule(Weekday::Wed, t(13, 0, 0), t(17, 0, 0));
        let oracle = oracle();

        assert!(oracle.is_open(&schedule, Some("UTC"), wed(11, 0, 0)));
        assert!(!oracle.is_open(&schedule, Some("UTC"), wed(12, 30, 0)));
        assert!(oracle.is_open(&schedule, Some("UTC"), wed(16, 0, 0)));
    }

    #[test]
    fn test_non_workday_exception_closes_whole_day() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let schedule = Schedule::new("s")
            .with_rule(Weekday::Wed, t(9, 0, 0), t(18, 0, 0))
            .with_exception(DateException::closed(date));
        let oracle = oracle();

        for hour in [9, 12, 17] {
            assert!(!oracle.is_open(&schedule, Some("UTC"), wed(hour, 0, 0)));
        }
    }

    #[test]
    fn test_closure_beats_same_day_workday_exception() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let schedule = Schedule::new("s")
            .with_exception(DateException::open(date, t(9, 0, 0), t(18, 0, 0)))
            .with_exception(DateException::closed(date));

        assert!(!oracle().is_open(&schedule, Some("UTC"), wed(10, 0, 0)));
    }

    #[test]
    fn test_workday_exception_replaces_rules() {
        // 2025-01-18 is a Saturday with no weekly rule.
        let date = NaiveDate::from_ymd_opt(2025, 1, 18).unwrap();
        let schedule = Schedule::new("s")
            .with_rule(Weekday::Wed, t(9, 0, 0), t(18, 0, 0))
            .with_exception(DateException::open(date, t(11, 0, 0), t(12, 0, 0)));
        let oracle = oracle();

        let at = |h, m| Utc.with_ymd_and_hms(2025, 1, 18, h, m, 0).unwrap();
        assert!(oracle.is_open(&schedule, Some("UTC"), at(11, 30)));
        assert!(!oracle.is_open(&schedule, Some("UTC"), at(12, 30)));
    }

    #[test]
    fn test_unmatched_workday_exception_does_not_fall_back_to_rules() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let schedule = Schedule::new("s")
            .with_rule(Weekday::Wed, t(9, 0, 0), t(18, 0, 0))
            .with_exception(DateException::open(date, t(14, 0, 0), t(15, 0, 0)));

        // Inside the weekly rule but outside the exception.
        assert!(!oracle().is_open(&schedule, Some("UTC"), wed(10, 0, 0)));
        assert!(oracle().is_open(&schedule, Some("UTC"), wed(14, 30, 0)));
    }

    #[test]
    fn test_workday_exception_without_hours_closes_day() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let schedule = Schedule::new("s")
            .with_rule(Weekday::Wed, t(9, 0, 0), t(18, 0, 0))
            .with_exception(DateException {
                date,
                is_workday: true,
                start_time: None,
                end_time: None,
            });

        assert!(!oracle().is_open(&schedule, Some("UTC"), wed(10, 0, 0)));
        assert!(oracle()
            .working_intervals_for_date(&schedule, date)
            .is_empty());
    }

    #[test]
    fn test_inverted_rule_is_skipped_not_fatal() {
        let schedule = Schedule::new("s")
            .with_rule(Weekday::Wed, t(18, 0, 0), t(9, 0, 0))
            .with_rule(Weekday::Wed, t(14, 0, 0), t(16, 0, 0));
        let oracle = oracle();

        assert!(!oracle.is_open(&schedule, Some("UTC"), wed(10, 0, 0)));
        assert!(oracle.is_open(&schedule, Some("UTC"), wed(15, 0, 0)));
    }

    #[test]
    fn test_evaluates_in_office_zone() {
        // Kyiv is UTC+2 in January: 07:30 UTC is 09:30 local.
        let schedule = wednesday_morning();
        let oracle = oracle();

        assert!(oracle.is_open(&schedule, Some("Europe/Kyiv"), wed(7, 30, 0)));
        assert!(!oracle.is_open(&schedule, Some("UTC"), wed(7, 30, 0)));
        // 11:00 UTC is 13:00 local, the closing boundary.
        assert!(!oracle.is_open(&schedule, Some("Europe/Kyiv"), wed(11, 0, 0)));
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 23:30 UTC on Tuesday is already Wednesday in Kyiv.
        let tuesday_late = Utc.with_ymd_and_hms(2025, 1, 14, 23, 30, 0).unwrap();
        let date = oracle().local_date(Some("Europe/Kyiv"), tuesday_late);
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn test_unknown_zone_falls_back_to_system_zone() {
        let schedule = wednesday_morning();
        let oracle = ScheduleOracle::new(chrono_tz::Europe::Kyiv);

        assert_eq!(oracle.resolve_zone(Some("Mars/Olympus")), chrono_tz::Europe::Kyiv);
        assert_eq!(oracle.resolve_zone(Some("  ")), chrono_tz::Europe::Kyiv);
        assert_eq!(oracle.resolve_zone(None), chrono_tz::Europe::Kyiv);
        // Evaluated as Kyiv time: 07:30 UTC is 09:30 local.
        assert!(oracle.is_open(&schedule, Some("Mars/Olympus"), wed(7, 30, 0)));
    }

    #[test]
    fn test_is_open_is_deterministic() {
        let schedule = wednesday_morning();
        let oracle = oracle();
        let at = wed(10, 15, 0);
        let first = oracle.is_open(&schedule, Some("UTC"), at);
        for _ in 0..10 {
            assert_eq!(oracle.is_open(&schedule, Some("UTC"), at), first);
        }
    }

    #[test]
    fn test_working_intervals_follow_precedence() {
        let holiday = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();
        let short_day = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        let schedule = Schedule::new("s")
            .with_rule(Weekday::Wed, t(9, 0, 0), t(12, 0, 0))
            .with_rule(Weekday::Wed, t(13, 0, 0), t(17, 0, 0))
            .with_exception(DateException::closed(holiday))
            .with_exception(DateException::open(short_day, t(10, 0, 0), t(12, 0, 0)));
        let oracle = oracle();

        let regular = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(
            oracle.working_intervals_for_date(&schedule, regular),
            vec![
                Interval::new(t(9, 0, 0), t(12, 0, 0)),
                Interval::new(t(13, 0, 0), t(17, 0, 0)),
            ]
        );
        assert!(oracle.working_intervals_for_date(&schedule, holiday).is_empty());
        assert_eq!(
            oracle.working_intervals_for_date(&schedule, short_day),
            vec![Interval::new(t(10, 0, 0), t(12, 0, 0))]
        );
    }

    #[test]
    fn test_plan_kinds() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let schedule = wednesday_morning();
        assert!(matches!(plan_for_date(&schedule, date), DayPlan::Weekly(_)));

        let schedule = schedule.with_exception(DateException::closed(date));
        assert_eq!(plan_for_date(&schedule, date), DayPlan::Closed);
    }
}
