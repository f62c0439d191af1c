//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Status of a queue ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Waiting,
    Called,
    Serving,
    Completed,
    NoShow,
    Cancelled,
    Postponed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 7] = [
        TicketStatus::Waiting,
        TicketStatus::Called,
        TicketStatus::Serving,
        TicketStatus::Completed,
        TicketStatus::NoShow,
        TicketStatus::Cancelled,
        TicketStatus::Postponed,
    ];

    /// Stored and serialized name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Waiting => "Waiting",
            TicketStatus::Called => "Called",
            TicketStatus::Serving => "Serving",
            TicketStatus::Completed => "Completed",
            TicketStatus::NoShow => "NoShow",
            TicketStatus::Cancelled => "Cancelled",
            TicketStatus::Postponed => "Postponed",
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Completed | TicketStatus::NoShow | TicketStatus::Cancelled
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown ticket status: {}", s))
    }
}

/// A visitor's place in an office queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// `PREFIX-{office}-{YYYYMMDD}-{seq}`
    pub id: String,
    /// Zero-padded sequence shown to the visitor.
    pub number: String,
    pub sequence: u32,
    pub office_id: String,
    pub service_id: String,
    pub status: TicketStatus,
    /// Higher is served first.
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_point_id: Option<String>,
    pub issue_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_service_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    /// Minutes between start of service and completion, two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_service_time_mins: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_phone: Option<String>,
    #[serde(default)]
    pub is_appointment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_datetime: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Incremented by every persisted transition.
    #[serde(default)]
    pub version: i64,
}

impl Ticket {
    /// A freshly issued walk-in ticket.
    pub fn waiting(
        id: String,
        sequence: u32,
        office_id: impl Into<String>,
        service_id: impl Into<String>,
        issue_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            number: format_number(sequence),
            sequence,
            office_id: office_id.into(),
            service_id: service_id.into(),
            status: TicketStatus::Waiting,
            priority: 0,
            operator_id: None,
            service_point_id: None,
            issue_time,
            call_time: None,
            start_service_time: None,
            completion_time: None,
            actual_service_time_mins: None,
            visitor_phone: None,
            is_appointment: false,
            appointment_datetime: None,
            updated_at: issue_time,
            version: 0,
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the visitor's phone.
    pub fn with_visitor_phone(mut self, phone: Option<String>) -> Self {
        self.visitor_phone = phone;
        self
    }

    /// The number shown on boards: the last segment of the id.
    pub fn short_number(&self) -> &str {
        self.id.rsplit('-').next().unwrap_or(&self.id)
    }

    /// Latest of call, start and completion time.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        [self.call_time, self.start_service_time, self.completion_time]
            .into_iter()
            .flatten()
            .max()
    }
}

/// Sequence zero-padded to at least four digits.
pub fn format_number(sequence: u32) -> String {
    format!("{:04}", sequence)
}

/// Compose a ticket id from its parts.
pub fn compose_ticket_id(prefix: &str, office: &str, date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}-{}-{}-{}",
        prefix,
        office,
        date.format("%Y%m%d"),
        format_number(sequence)
    )
}
