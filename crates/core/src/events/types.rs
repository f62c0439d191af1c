//! Queue event payloads and their envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ticket::{Ticket, TicketStatus};

/// Ticket projection with resolved display names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketView {
    pub id: String,
    pub number: String,
    pub short_number: String,
    pub office_id: String,
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    pub status: TicketStatus,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_point_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_point_name: Option<String>,
    pub issue_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_service_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_service_time_mins: Option<f64>,
}

impl TicketView {
    pub fn new(
        ticket: &Ticket,
        service_name: Option<String>,
        service_point_name: Option<String>,
    ) -> Self {
        Self {
            id: ticket.id.clone(),
            number: ticket.number.clone(),
            short_number: ticket.short_number().to_string(),
            office_id: ticket.office_id.clone(),
            service_id: ticket.service_id.clone(),
            service_name,
            status: ticket.status,
            priority: ticket.priority,
            operator_id: ticket.operator_id.clone(),
            service_point_id: ticket.service_point_id.clone(),
            service_point_name,
            issue_time: ticket.issue_time,
            call_time: ticket.call_time,
            start_service_time: ticket.start_service_time,
            completion_time: ticket.completion_time,
            actual_service_time_mins: ticket.actual_service_time_mins,
        }
    }
}

/// Per-office queue counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueStats {
    pub office_id: String,
    /// Tickets currently waiting.
    pub waiting: i64,
    /// Tickets completed since the start of the office-local day.
    pub served_today: i64,
}

/// Queue events published after a committed write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    TicketIssued {
        ticket: TicketView,
    },
    TicketUpdated {
        ticket: TicketView,
        previous_status: TicketStatus,
    },
    StatsChanged {
        stats: QueueStats,
    },
}

impl QueueEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::TicketIssued { .. } => "ticket_issued",
            QueueEvent::TicketUpdated { .. } => "ticket_updated",
            QueueEvent::StatsChanged { .. } => "stats_changed",
        }
    }
}

/// Envelope wrapping a queue event with routing metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub id: Uuid,
    /// Subscribers are scoped to an office.
    pub office_id: String,
    pub emitted_at: DateTime<Utc>,
    pub event: QueueEvent,
}

impl EventEnvelope {
    pub fn new(office_id: impl Into<String>, emitted_at: DateTime<Utc>, event: QueueEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            office_id: office_id.into(),
            emitted_at,
            event,
        }
    }
}
