//! Operator actions on called tickets and the operator's own ticket views.

use tracing::{info, warn};

use super::context::QueueContext;
use super::outcome::{InternalContext, ServiceError};
use crate::directory::Operator;
use crate::events::TicketView;
use crate::metrics;
use crate::ticket::{lifecycle, Action, Ticket, TicketFilter, TicketOrder, TicketStatus};

/// Enforces the ticket state machine for operator actions.
#[derive(Clone)]
pub struct LifecycleService {
    ctx: QueueContext,
}

impl LifecycleService {
    pub fn new(ctx: QueueContext) -> Self {
        Self { ctx }
    }

    /// `Called -> Serving`.
    pub async fn start_service(&self, ticket_id: &str, user_id: &str) -> Result<TicketView, ServiceError> {
        let operator = self.ctx.operator_for_user(user_id)?;
        self.perform(
            ticket_id,
            Action::StartService {
                operator_id: operator.id,
            },
        )
    }

    /// `Serving -> Completed`, recording the service duration.
    pub async fn finish(&self, ticket_id: &str, user_id: &str) -> Result<TicketView, ServiceError> {
        let operator = self.ctx.operator_for_user(user_id)?;
        let view = self.perform(
            ticket_id,
            Action::Finish {
                operator_id: operator.id,
            },
        )?;
        if let Some(minutes) = view.actual_service_time_mins {
            metrics::SERVICE_DURATION
                .with_label_values(&[view.service_id.as_str()])
                .observe(minutes);
        }
        Ok(view)
    }

    /// `Called | Serving -> NoShow`.
    pub async fn mark_no_show(&self, ticket_id: &str, user_id: &str) -> Result<TicketView, ServiceError> {
        let operator = self.ctx.operator_for_user(user_id)?;
        self.perform(
            ticket_id,
            Action::MarkNoShow {
                operator_id: operator.id,
            },
        )
    }

    /// `Serving -> Postponed`.
    pub async fn postpone(&self, ticket_id: &str, user_id: &str) -> Result<TicketView, ServiceError> {
        let operator = self.ctx.operator_for_user(user_id)?;
        self.perform(
            ticket_id,
            Action::Postpone {
                operator_id: operator.id,
            },
        )
    }

    /// `Postponed -> Called`, reassigned to the recalling operator and point.
    pub async fn recall(
        &self,
        ticket_id: &str,
        user_id: &str,
        service_point_id: &str,
    ) -> Result<TicketView, ServiceError> {
        let operator = self.ctx.operator_for_user(user_id)?;

        let service_point_id = service_point_id.trim();
        if service_point_id.is_empty() {
            return Err(ServiceError::invalid_input("service_point_id is required"));
        }
        let point = self
            .ctx
            .directory
            .service_point(service_point_id)
            .internal("load_service_point", service_point_id)?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Service point not found: {}", service_point_id))
            })?;

        let ticket = self.load(ticket_id)?;
        if point.office_id.as_deref() != Some(ticket.office_id.as_str()) {
            return Err(ServiceError::precondition_failed(format!(
                "Service point {} does not belong to the ticket's office",
                point.name
            )));
        }

        self.apply(
            ticket,
            Action::Recall {
                operator_id: operator.id,
                service_point_id: point.id,
            },
        )
    }

    /// The operator's postponed tickets, most recently updated first.
    pub async fn held_tickets(&self, user_id: &str) -> Result<Vec<TicketView>, ServiceError> {
        let operator = self.ctx.operator_for_user(user_id)?;
        self.tickets_of(
            &operator,
            &[TicketStatus::Postponed],
            TicketOrder::RecentlyUpdated,
        )
    }

    /// The operator's called and in-service tickets.
    pub async fn active_tickets(&self, user_id: &str) -> Result<Vec<TicketView>, ServiceError> {
        let operator = self.ctx.operator_for_user(user_id)?;
        self.tickets_of(
            &operator,
            &[TicketStatus::Called, TicketStatus::Serving],
            TicketOrder::LatestActivity,
        )
    }

    fn tickets_of(
        &self,
        operator: &Operator,
        statuses: &[TicketStatus],
        order: TicketOrder,
    ) -> Result<Vec<TicketView>, ServiceError> {
        let tickets = self
            .ctx
            .tickets
            .list(
                &TicketFilter::new()
                    .with_operator(&operator.id)
                    .with_statuses(statuses.iter().copied())
                    .with_order(order),
            )
            .internal("list_operator_tickets", &operator.id)?;
        Ok(tickets.iter().map(|t| self.ctx.view(t)).collect())
    }

    fn load(&self, ticket_id: &str) -> Result<Ticket, ServiceError> {
        let ticket_id = ticket_id.trim();
        if ticket_id.is_empty() {
            return Err(ServiceError::invalid_input("ticket_id is required"));
        }
        self.ctx
            .tickets
            .get(ticket_id)
            .internal("load_ticket", ticket_id)?
            .ok_or_else(|| ServiceError::not_found(format!("Ticket not found: {}", ticket_id)))
    }

    fn perform(&self, ticket_id: &str, action: Action) -> Result<TicketView, ServiceError> {
        let ticket = self.load(ticket_id)?;
        self.apply(ticket, action)
    }

    fn apply(&self, ticket: Ticket, action: Action) -> Result<TicketView, ServiceError> {
        let transition = lifecycle::apply(&ticket, &action, self.ctx.clock.now()).map_err(|e| {
            warn!(
                ticket_id = %ticket.id,
                action = action.name(),
                operator_id = action.operator_id(),
                error = %e,
                "Transition rejected"
            );
            ServiceError::from(e)
        })?;

        if !self.ctx.commit(&transition)? {
            warn!(
                ticket_id = %ticket.id,
                action = action.name(),
                expected = %transition.expected_status(),
                expected_version = transition.expected_version(),
                "Ticket changed concurrently, transition not applied"
            );
            return Err(ServiceError::precondition_failed(format!(
                "Ticket {} was changed by someone else, reload and try again",
                ticket.id
            )));
        }

        metrics::TRANSITIONS
            .with_label_values(&[transition.ticket.status.as_str()])
            .inc();
        info!(
            ticket_id = %ticket.id,
            action = action.name(),
            from = %transition.previous_status,
            to = %transition.ticket.status,
            operator_id = action.operator_id(),
            "Ticket transition committed"
        );

        Ok(self.ctx.view(&transition.ticket))
    }
}
