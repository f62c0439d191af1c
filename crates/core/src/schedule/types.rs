//! Schedule data types: weekly rules, date exceptions and open intervals.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A half-open wall-clock interval `[start, end)` in an office's local time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Interval {
    /// Create a new interval.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Returns true if the interval is non-empty (`start < end`).
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Returns true if `time` falls within `[start, end)`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// One working shift on a given day of the week.
///
/// Several rules may exist for the same day (split shifts).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyRule {
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl WeeklyRule {
    /// Create a new weekly rule.
    pub fn new(day_of_week: Weekday, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            day_of_week,
            start_time,
            end_time,
        }
    }

    /// The rule's interval.
    pub fn interval(&self) -> Interval {
        Interval::new(self.start_time, self.end_time)
    }
}

/// An override for one literal calendar date.
///
/// A non-workday exception closes the office for the whole date. Workday
/// exceptions replace the weekly rules for that date with their own interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateException {
    pub date: NaiveDate,
    pub is_workday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
}

impl DateException {
    /// A full-day closure.
    pub fn closed(date: NaiveDate) -> Self {
        Self {
            date,
            is_workday: false,
            start_time: None,
            end_time: None,
        }
    }

    /// A working day with special hours.
    pub fn open(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            is_workday: true,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    /// The exception's interval, if it carries both bounds.
    pub fn interval(&self) -> Option<Interval> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(Interval::new(start, end)),
            _ => None,
        }
    }
}

/// Weekly rules plus date exceptions describing when an office serves visitors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<WeeklyRule>,
    #[serde(default)]
    pub exceptions: Vec<DateException>,
}

impl Schedule {
    /// Create an empty schedule.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a weekly rule.
    pub fn with_rule(mut self, day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        self.rules.push(WeeklyRule::new(day, start, end));
        self
    }

    /// Add a date exception.
    pub fn with_exception(mut self, exception: DateException) -> Self {
        self.exceptions.push(exception);
        self
    }

    /// Rules that apply to the given day of the week, in stored order.
    pub fn rules_for(&self, day: Weekday) -> impl Iterator<Item = &WeeklyRule> {
        self.rules.iter().filter(move |r| r.day_of_week == day)
    }

    /// Exceptions recorded for the given date.
    pub fn exceptions_on(&self, date: NaiveDate) -> Vec<&DateException> {
        self.exceptions.iter().filter(|e| e.date == date).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_interval_is_half_open() {
        let interval = Interval::new(t(9, 0), t(13, 0));
        assert!(interval.contains(t(9, 0)));
        assert!(interval.contains(t(12, 59)));
        assert!(!interval.contains(t(13, 0)));
        assert!(!interval.contains(t(8, 59)));
    }

    #[test]
    fn test_inverted_interval_is_invalid() {
        assert!(!Interval::new(t(13, 0), t(9, 0)).is_valid());
        assert!(!Interval::new(t(9, 0), t(9, 0)).is_valid());
        assert!(Interval::new(t(9, 0), t(9, 1)).is_valid());
    }

    #[test]
    fn test_rules_for_day_keeps_multiple_shifts() {
        let schedule = Schedule::new("s")
            .with_rule(Weekday::Mon, t(9, 0), t(12, 0))
            .with_rule(Weekday::Tue, t(9, 0), t(18, 0))
            .with_rule(Weekday::Mon, t(13, 0), t(17, 0));

        let monday: Vec<_> = schedule.rules_for(Weekday::Mon).collect();
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[1].start_time, t(13, 0));
    }

    #[test]
    fn test_exception_without_bounds_has_no_interval() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let exception = DateException {
            date,
            is_workday: true,
            start_time: Some(t(10, 0)),
            end_time: None,
        };
        assert!(exception.interval().is_none());
        assert!(DateException::closed(date).interval().is_none());
    }
}
