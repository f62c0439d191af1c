//! Ticket status state machine.
//!
//! Transitions are pure: they take a ticket snapshot and return the next
//! snapshot together with the side effects the caller must carry out. The
//! persist effect names the status and version the write must be conditioned
//! on, so a snapshot that went stale in between never lands.
//!
//! ```text
//! Waiting   -> Called                 call
//! Called    -> Serving                start service
//! Serving   -> Completed              finish
//! Called    -> NoShow                 no-show
//! Serving   -> NoShow                 no-show
//! Serving   -> Postponed              postpone
//! Postponed -> Called                 recall
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Ticket, TicketStatus};

/// An operator action on a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Call {
        operator_id: String,
        service_point_id: String,
    },
    StartService {
        operator_id: String,
    },
    Finish {
        operator_id: String,
    },
    MarkNoShow {
        operator_id: String,
    },
    Postpone {
        operator_id: String,
    },
    /// Any operator may recall; the ticket is reassigned to them.
    Recall {
        operator_id: String,
        service_point_id: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Call { .. } => "call",
            Action::StartService { .. } => "start_service",
            Action::Finish { .. } => "finish",
            Action::MarkNoShow { .. } => "mark_no_show",
            Action::Postpone { .. } => "postpone",
            Action::Recall { .. } => "recall",
        }
    }

    /// Statuses the action may be applied from.
    pub fn allowed_from(&self) -> &'static [TicketStatus] {
        match self {
            Action::Call { .. } => &[TicketStatus::Waiting],
            Action::StartService { .. } => &[TicketStatus::Called],
            Action::Finish { .. } => &[TicketStatus::Serving],
            Action::MarkNoShow { .. } => &[TicketStatus::Called, TicketStatus::Serving],
            Action::Postpone { .. } => &[TicketStatus::Serving],
            Action::Recall { .. } => &[TicketStatus::Postponed],
        }
    }

    /// Status the ticket ends up in.
    pub fn target(&self) -> TicketStatus {
        match self {
            Action::Call { .. } | Action::Recall { .. } => TicketStatus::Called,
            Action::StartService { .. } => TicketStatus::Serving,
            Action::Finish { .. } => TicketStatus::Completed,
            Action::MarkNoShow { .. } => TicketStatus::NoShow,
            Action::Postpone { .. } => TicketStatus::Postponed,
        }
    }

    pub fn operator_id(&self) -> &str {
        match self {
            Action::Call { operator_id, .. }
            | Action::StartService { operator_id }
            | Action::Finish { operator_id }
            | Action::MarkNoShow { operator_id }
            | Action::Postpone { operator_id }
            | Action::Recall { operator_id, .. } => operator_id,
        }
    }

    /// Whether the acting operator must be the one the ticket is assigned to.
    fn requires_owner(&self) -> bool {
        !matches!(self, Action::Call { .. } | Action::Recall { .. })
    }
}

/// Work the caller performs after a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Store the new snapshot iff the stored ticket is still at
    /// `expected_status` and `expected_version`.
    Persist {
        expected_status: TicketStatus,
        expected_version: i64,
    },
    /// Publish the updated ticket.
    NotifyTicket { previous_status: TicketStatus },
    /// Publish refreshed queue statistics for the office.
    NotifyStats,
}

/// A computed transition, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub ticket: Ticket,
    pub previous_status: TicketStatus,
    pub effects: Vec<Effect>,
}

impl Transition {
    /// Status the persist effect is conditioned on.
    pub fn expected_status(&self) -> TicketStatus {
        self.persist_condition()
            .map(|(status, _)| status)
            .unwrap_or(self.previous_status)
    }

    /// Version the persist effect is conditioned on.
    pub fn expected_version(&self) -> i64 {
        self.persist_condition()
            .map(|(_, version)| version)
            .unwrap_or(self.ticket.version - 1)
    }

    fn persist_condition(&self) -> Option<(TicketStatus, i64)> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Persist {
                expected_status,
                expected_version,
            } => Some((*expected_status, *expected_version)),
            _ => None,
        })
    }
}

/// Error type for rejected transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot {action} ticket {ticket_id}: current status is {current}")]
    InvalidStatus {
        ticket_id: String,
        action: &'static str,
        current: TicketStatus,
    },

    #[error("Ticket {ticket_id} is assigned to another operator")]
    OperatorMismatch {
        ticket_id: String,
        assigned: Option<String>,
        actor: String,
    },
}

/// Apply `action` to `ticket` at instant `now`.
pub fn apply(
    ticket: &Ticket,
    action: &Action,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionError> {
    if !action.allowed_from().contains(&ticket.status) {
        return Err(TransitionError::InvalidStatus {
            ticket_id: ticket.id.clone(),
            action: action.name(),
            current: ticket.status,
        });
    }

    if action.requires_owner() && ticket.operator_id.as_deref() != Some(action.operator_id()) {
        return Err(TransitionError::OperatorMismatch {
            ticket_id: ticket.id.clone(),
            assigned: ticket.operator_id.clone(),
            actor: action.operator_id().to_string(),
        });
    }

    let mut next = ticket.clone();
    next.status = action.target();
    next.updated_at = now;
    next.version = ticket.version + 1;

    match action {
        Action::Call {
            operator_id,
            service_point_id,
        } => {
            next.operator_id = Some(operator_id.clone());
            next.service_point_id = Some(service_point_id.clone());
            next.call_time = Some(now);
        }
        Action::StartService { .. } => {
            next.start_service_time = Some(now);
        }
        Action::Finish { .. } => {
            next.completion_time = Some(now);
            next.actual_service_time_mins =
                Some(service_minutes(next.start_service_time, now));
        }
        Action::MarkNoShow { .. } => {
            next.completion_time = Some(now);
        }
        Action::Postpone { .. } => {}
        Action::Recall {
            operator_id,
            service_point_id,
        } => {
            next.operator_id = Some(operator_id.clone());
            next.service_point_id = Some(service_point_id.clone());
            next.call_time = Some(now);
            next.start_service_time = None;
            next.completion_time = None;
            next.actual_service_time_mins = None;
        }
    }

    let mut effects = vec![
        Effect::Persist {
            expected_status: ticket.status,
            expected_version: ticket.version,
        },
        Effect::NotifyTicket {
            previous_status: ticket.status,
        },
    ];
    // Waiting count or served count changes.
    if matches!(action, Action::Call { .. } | Action::Finish { .. }) {
        effects.push(Effect::NotifyStats);
    }

    Ok(Transition {
        ticket: next,
        previous_status: ticket.status,
        effects,
    })
}

/// Minutes from `start` to `end`, rounded to two decimals, never negative.
///
/// A missing start counts as zero minutes.
pub fn service_minutes(start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> f64 {
    let Some(start) = start else {
        return 0.0;
    };
    let millis = (end - start).num_milliseconds().max(0);
    let minutes = millis as f64 / 60_000.0;
    (minutes * 100.0).round() / 100.0
}
