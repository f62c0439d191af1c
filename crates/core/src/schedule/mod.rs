//! Office schedules and the open/closed evaluator.

mod oracle;
mod slots;
mod types;

pub use oracle::{plan_for_date, DayPlan, ScheduleOracle};
pub use slots::{slot_starts, MAX_SLOTS_PER_INTERVAL};
pub use types::{DateException, Interval, Schedule, WeeklyRule};
