//! Collaborators shared by the queue services.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::outcome::{InternalContext, ServiceError};
use crate::clock::Clock;
use crate::directory::{Directory, Office, Operator};
use crate::events::{EventEnvelope, EventSink, QueueEvent, QueueStats, TicketView};
use crate::schedule::ScheduleOracle;
use crate::ticket::{Effect, Ticket, TicketFilter, TicketStatus, TicketStore, Transition};

/// Stores, clock, event sink and oracle used by every service.
#[derive(Clone)]
pub struct QueueContext {
    pub tickets: Arc<dyn TicketStore>,
    pub directory: Arc<dyn Directory>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
    pub oracle: ScheduleOracle,
}

impl QueueContext {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        oracle: ScheduleOracle,
    ) -> Self {
        Self {
            tickets,
            directory,
            clock,
            events,
            oracle,
        }
    }

    pub(crate) fn office(&self, office_id: &str) -> Result<Office, ServiceError> {
        self.directory
            .office(office_id)
            .internal("load_office", office_id)?
            .ok_or_else(|| ServiceError::not_found(format!("Office not found: {}", office_id)))
    }

    /// The active operator linked to `user_id`.
    pub(crate) fn operator_for_user(&self, user_id: &str) -> Result<Operator, ServiceError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ServiceError::invalid_input("Operator identity is required"));
        }
        self.directory
            .active_operator_for_user(user_id)
            .internal("load_operator", user_id)?
            .ok_or_else(|| {
                ServiceError::not_found(format!("No active operator for user {}", user_id))
            })
    }

    /// Project a ticket with service and service point names.
    ///
    /// Name lookups are best effort; a failed lookup leaves the name empty.
    pub(crate) fn view(&self, ticket: &Ticket) -> TicketView {
        let service_name = match self.directory.service(&ticket.service_id) {
            Ok(service) => service.map(|s| s.name),
            Err(e) => {
                warn!(ticket_id = %ticket.id, error = %e, "Failed to resolve service name");
                None
            }
        };

        let point_name = match ticket.service_point_id.as_deref() {
            Some(point_id) => match self.directory.service_point(point_id) {
                Ok(point) => point.map(|p| p.name),
                Err(e) => {
                    warn!(ticket_id = %ticket.id, error = %e, "Failed to resolve service point name");
                    None
                }
            },
            None => None,
        };

        TicketView::new(ticket, service_name, point_name)
    }

    pub(crate) fn publish(&self, office_id: &str, event: QueueEvent) {
        debug!(office_id, event_type = event.event_type(), "Publishing queue event");
        self.events
            .publish(EventEnvelope::new(office_id, self.clock.now(), event));
    }

    /// Waiting count and today's served count for an office.
    pub(crate) fn stats_for(
        &self,
        office: &Office,
        now: DateTime<Utc>,
    ) -> Result<QueueStats, ServiceError> {
        let waiting = self
            .tickets
            .count(
                &TicketFilter::new()
                    .with_office(&office.id)
                    .with_status(TicketStatus::Waiting),
            )
            .internal("count_waiting", &office.id)?;

        let served_today = self
            .tickets
            .count(
                &TicketFilter::new()
                    .with_office(&office.id)
                    .with_status(TicketStatus::Completed)
                    .completed_since(self.local_day_start(office, now)),
            )
            .internal("count_served", &office.id)?;

        Ok(QueueStats {
            office_id: office.id.clone(),
            waiting,
            served_today,
        })
    }

    fn publish_stats(&self, office_id: &str) {
        let office = match self.directory.office(office_id) {
            Ok(Some(office)) => office,
            Ok(None) => {
                warn!(office_id, "Skipping stats event for unknown office");
                return;
            }
            Err(e) => {
                warn!(office_id, error = %e, "Skipping stats event, office lookup failed");
                return;
            }
        };

        match self.stats_for(&office, self.clock.now()) {
            Ok(stats) => self.publish(office_id, QueueEvent::StatsChanged { stats }),
            Err(e) => warn!(office_id, error = %e, "Skipping stats event, counting failed"),
        }
    }

    /// Persist a computed transition and publish its notifications.
    ///
    /// Returns false if the ticket was written since the transition's
    /// snapshot was read; nothing is written or published in that case.
    pub(crate) fn commit(&self, transition: &Transition) -> Result<bool, ServiceError> {
        let ticket = &transition.ticket;

        let applied = self
            .tickets
            .update_if_unchanged(
                ticket,
                transition.expected_status(),
                transition.expected_version(),
            )
            .internal("update_ticket", &ticket.id)?;
        if !applied {
            return Ok(false);
        }

        for effect in &transition.effects {
            match effect {
                Effect::Persist { .. } => {}
                Effect::NotifyTicket { previous_status } => self.publish(
                    &ticket.office_id,
                    QueueEvent::TicketUpdated {
                        ticket: self.view(ticket),
                        previous_status: *previous_status,
                    },
                ),
                Effect::NotifyStats => self.publish_stats(&ticket.office_id),
            }
        }

        Ok(true)
    }
}
