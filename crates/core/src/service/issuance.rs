//! Walk-in ticket issuance.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use super::context::QueueContext;
use super::hours::Gate;
use super::outcome::{ErrorKind, Info, InternalContext, Outcome, ServiceError, ServiceResult};
use crate::events::QueueEvent;
use crate::metrics;
use crate::sequence::SequenceCounter;
use crate::ticket::{compose_ticket_id, Ticket};

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9+\- ]+$").unwrap());

/// Kiosk request for a walk-in ticket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueTicketRequest {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub office_id: String,
    #[serde(default)]
    pub visitor_phone: Option<String>,
}

/// Loosely normalize a visitor phone number.
///
/// Digits, `+`, `-` and spaces are accepted; runs of whitespace collapse to
/// one space. Anything else yields `None`.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if PHONE_PATTERN.is_match(&collapsed) && collapsed.chars().any(|c| c.is_ascii_digit()) {
        Some(collapsed)
    } else {
        None
    }
}

/// Validates requests, claims a sequence number and creates `Waiting` tickets.
#[derive(Clone)]
pub struct IssuanceService {
    ctx: QueueContext,
    counter: SequenceCounter,
    ticket_prefix: String,
}

impl IssuanceService {
    pub fn new(ctx: QueueContext, counter: SequenceCounter, ticket_prefix: impl Into<String>) -> Self {
        Self {
            ctx,
            counter,
            ticket_prefix: ticket_prefix.into(),
        }
    }

    /// Issue a ticket, or report that the office is closed.
    pub async fn issue_ticket(&self, request: &IssueTicketRequest) -> ServiceResult<Ticket> {
        let result = self.issue(request).await;
        let label = match &result {
            Ok(Outcome::Ok(_)) => "issued",
            Ok(Outcome::Info(_)) => "closed",
            Err(e) if e.kind == ErrorKind::Internal => "error",
            Err(_) => "rejected",
        };
        metrics::TICKETS_ISSUED.with_label_values(&[label]).inc();
        result
    }

    async fn issue(&self, request: &IssueTicketRequest) -> ServiceResult<Ticket> {
        let service_id = request.service_id.trim();
        let office_id = request.office_id.trim();
        if service_id.is_empty() || office_id.is_empty() {
            return Err(ServiceError::invalid_input(
                "Both service_id and office_id are required",
            ));
        }

        let service = self
            .ctx
            .directory
            .service(service_id)
            .internal("load_service", service_id)?
            .ok_or_else(|| ServiceError::not_found(format!("Service not found: {}", service_id)))?;
        let office = self.ctx.office(office_id)?;

        if !service.enabled || !service.live_queue_enabled {
            return Err(ServiceError::precondition_failed(format!(
                "Service {} is not available for the live queue",
                service.name
            )));
        }

        let offered = self
            .ctx
            .directory
            .office_services(&office.id)
            .internal("load_office_services", &office.id)?
            .iter()
            .any(|a| a.service_id == service.id && a.is_active);
        if !offered {
            return Err(ServiceError::precondition_failed(format!(
                "Service {} is not offered at office {}",
                service.name, office.name
            )));
        }

        let now = self.ctx.clock.now();
        match self.ctx.gate(&office, now) {
            Gate::Open => {}
            Gate::Closed => {
                info!(office_id = %office.id, service_id = %service.id, "Issuance refused, office closed");
                return Ok(Outcome::Info(Info::office_closed()));
            }
            Gate::NoSchedule => {
                return Err(ServiceError::configuration(format!(
                    "No schedule is configured for office {}",
                    office.name
                )));
            }
        }

        let visitor_phone = request.visitor_phone.as_deref().and_then(|raw| {
            let normalized = normalize_phone(raw);
            if normalized.is_none() && !raw.trim().is_empty() {
                warn!(office_id = %office.id, "Dropping malformed visitor phone");
            }
            normalized
        });

        let date = self.ctx.local_date(&office, now);
        let sequence = self.counter.next_sequence(&office.id, date).await?;

        let id = compose_ticket_id(&self.ticket_prefix, office.identifier(), date, sequence);
        let ticket = Ticket::waiting(id, sequence, &office.id, &service.id, now)
            .with_visitor_phone(visitor_phone);

        self.ctx
            .tickets
            .insert(&ticket)
            .internal("insert_ticket", &ticket.id)?;

        info!(
            ticket_id = %ticket.id,
            office_id = %office.id,
            service_id = %service.id,
            "Ticket issued"
        );

        self.ctx.publish(
            &office.id,
            QueueEvent::TicketIssued {
                ticket: self.ctx.view(&ticket),
            },
        );
        match self.ctx.stats_for(&office, now) {
            Ok(stats) => self
                .ctx
                .publish(&office.id, QueueEvent::StatsChanged { stats }),
            Err(e) => warn!(office_id = %office.id, error = %e, "Skipping stats event"),
        }

        Ok(Outcome::Ok(ticket))
    }
}
