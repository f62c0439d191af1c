//! Office-hours gate shared by issuance and the read models.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tracing::{error, warn};

use super::context::QueueContext;
use crate::directory::{DirectoryError, Office};
use crate::schedule::Schedule;

/// Result of checking an office against its schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Gate {
    Open,
    Closed,
    /// Neither the office nor its organization has a usable schedule.
    NoSchedule,
}

impl QueueContext {
    /// The office's schedule, else its organization's default.
    ///
    /// A reference to a schedule that does not exist counts as no schedule.
    pub(crate) fn resolve_schedule(
        &self,
        office: &Office,
    ) -> Result<Option<Schedule>, DirectoryError> {
        if let Some(schedule_id) = office.schedule_id.as_deref() {
            match self.directory.schedule(schedule_id)? {
                Some(schedule) => return Ok(Some(schedule)),
                None => warn!(
                    office_id = %office.id,
                    schedule_id,
                    "Office references a missing schedule"
                ),
            }
        }

        let Some(org_id) = office.organization_id.as_deref() else {
            return Ok(None);
        };
        let Some(org) = self.directory.organization(org_id)? else {
            return Ok(None);
        };
        match org.default_schedule.as_deref() {
            Some(schedule_id) => self.directory.schedule(schedule_id),
            None => Ok(None),
        }
    }

    /// Whether the office is open at `at`. Load failures resolve to closed.
    pub(crate) fn gate(&self, office: &Office, at: DateTime<Utc>) -> Gate {
        match self.resolve_schedule(office) {
            Ok(Some(schedule)) => {
                if self
                    .oracle
                    .is_open(&schedule, office.timezone.as_deref(), at)
                {
                    Gate::Open
                } else {
                    Gate::Closed
                }
            }
            Ok(None) => Gate::NoSchedule,
            Err(e) => {
                error!(
                    office_id = %office.id,
                    error = %e,
                    "Failed to load schedule, treating office as closed"
                );
                Gate::Closed
            }
        }
    }

    /// Office-local calendar date of `at`.
    pub(crate) fn local_date(&self, office: &Office, at: DateTime<Utc>) -> NaiveDate {
        self.oracle.local_date(office.timezone.as_deref(), at)
    }

    /// First instant of the office-local day containing `at`.
    pub(crate) fn local_day_start(&self, office: &Office, at: DateTime<Utc>) -> DateTime<Utc> {
        let tz = self.oracle.resolve_zone(office.timezone.as_deref());
        let date = at.with_timezone(&tz).date_naive();
        let midnight = date.and_time(chrono::NaiveTime::MIN);

        // A DST gap can swallow midnight; the day then starts at the first valid hour.
        (0..3)
            .find_map(|h| {
                tz.from_local_datetime(&(midnight + Duration::hours(h)))
                    .earliest()
            })
            .map(|start| start.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }
}
