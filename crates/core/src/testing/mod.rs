//! Testing utilities: in-memory stores, a manual clock and a recording sink.
//!
//! These let the services run end to end without SQLite or wall-clock time.
//!
//! # Example
//!
//! ```rust,ignore
//! use cherga_core::testing::{fixtures, ManualClock, MemoryStore, RecordingEventSink};
//!
//! let store = MemoryStore::new();
//! fixtures::seed_office(&store, "office-1", &["passports"]);
//! let clock = ManualClock::new(fixtures::wednesday_at(10, 0));
//! let events = RecordingEventSink::new();
//!
//! // Build a QueueContext from these...
//! ```

mod clock;
mod memory_store;
mod sink;

pub use clock::ManualClock;
pub use memory_store::MemoryStore;
pub use sink::RecordingEventSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, NaiveTime, TimeZone, Utc, Weekday};

    use super::MemoryStore;
    use crate::directory::{Office, OfficeService, Operator, Service, ServicePoint};
    use crate::schedule::Schedule;
    use crate::ticket::Ticket;

    /// 2025-01-15 (a Wednesday) at `hour:minute` UTC.
    pub fn wednesday_at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, hour, minute, 0)
            .single()
            .unwrap_or_else(|| panic!("invalid fixture time {hour}:{minute}"))
    }

    /// 2025-01-18 (a Saturday) at `hour:minute` UTC.
    pub fn saturday_at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 18, hour, minute, 0)
            .single()
            .unwrap_or_else(|| panic!("invalid fixture time {hour}:{minute}"))
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| panic!("invalid fixture time {hour}:{minute}"))
    }

    /// Monday to Friday, 09:00 to 18:00.
    pub fn weekday_schedule(id: &str) -> Schedule {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .fold(Schedule::new(id), |schedule, day| {
            schedule.with_rule(day, hm(9, 0), hm(18, 0))
        })
    }

    /// Seed an open UTC office with a weekday schedule, the given services
    /// assigned in order, and one service point named `{office_id}-w1`.
    pub fn seed_office(store: &MemoryStore, office_id: &str, service_ids: &[&str]) -> Office {
        let schedule_id = format!("{office_id}-hours");
        store.add_schedule(weekday_schedule(&schedule_id));

        let office = Office::new(office_id, format!("Office {office_id}"))
            .with_timezone("UTC")
            .with_schedule(schedule_id);
        store.add_office(office.clone());

        for service_id in service_ids {
            store.add_service(Service::new(*service_id, format!("Service {service_id}")));
        }
        store.set_office_services(
            office_id,
            service_ids
                .iter()
                .map(|s| OfficeService::active(office_id, *s))
                .collect(),
        );
        store.add_service_point(service_point(&format!("{office_id}-w1"), office_id));
        office
    }

    pub fn service_point(id: &str, office_id: &str) -> ServicePoint {
        ServicePoint {
            id: id.to_string(),
            name: format!("Window {id}"),
            office_id: Some(office_id.to_string()),
        }
    }

    /// An active operator for `user_id` with the given skills.
    pub fn operator(id: &str, user_id: &str, skills: &[&str]) -> Operator {
        Operator::new(id, user_id, format!("Operator {id}")).with_skills(skills.iter().copied())
    }

    /// A waiting ticket with a predictable id.
    pub fn waiting_ticket(
        sequence: u32,
        office_id: &str,
        service_id: &str,
        issue_time: DateTime<Utc>,
    ) -> Ticket {
        Ticket::waiting(
            format!("TKT-{office_id}-{}-{sequence:04}", issue_time.format("%Y%m%d")),
            sequence,
            office_id,
            service_id,
            issue_time,
        )
    }
}
