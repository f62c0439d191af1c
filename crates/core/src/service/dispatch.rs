//! Next-ticket selection for operators.

use tracing::{debug, info, warn};

use super::context::QueueContext;
use super::outcome::{ErrorKind, Info, InternalContext, Outcome, ServiceError, ServiceResult};
use crate::config::DispatchConfig;
use crate::events::TicketView;
use crate::metrics;
use crate::ticket::{lifecycle, Action, TicketFilter, TicketOrder, TicketStatus};

/// Calls the best waiting ticket an operator is skilled for.
///
/// Selection order is priority descending, then issue time ascending. The
/// write is conditioned on the ticket still being `Waiting`; a candidate
/// taken by another operator in the meantime is skipped.
#[derive(Clone)]
pub struct DispatchService {
    ctx: QueueContext,
    candidate_batch: usize,
    max_rounds: u32,
}

impl DispatchService {
    pub fn new(ctx: QueueContext, config: &DispatchConfig) -> Self {
        Self {
            ctx,
            candidate_batch: config.candidate_batch.max(1),
            max_rounds: config.max_rounds.max(1),
        }
    }

    /// Call the next ticket to `service_point_id` on behalf of `user_id`.
    pub async fn call_next(&self, service_point_id: &str, user_id: &str) -> ServiceResult<TicketView> {
        let result = self.select(service_point_id, user_id).await;
        let label = match &result {
            Ok(Outcome::Ok(_)) => "called",
            Ok(Outcome::Info(_)) => "empty",
            Err(e) if e.kind == ErrorKind::Internal => "error",
            Err(_) => "rejected",
        };
        metrics::DISPATCH_RESULTS.with_label_values(&[label]).inc();
        result
    }

    async fn select(&self, service_point_id: &str, user_id: &str) -> ServiceResult<TicketView> {
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
        let office_id = point.office_id.as_deref().ok_or_else(|| {
            ServiceError::precondition_failed(format!(
                "Service point {} is not assigned to an office",
                point.name
            ))
        })?;
        let office = self.ctx.office(office_id)?;

        let operator = self.ctx.operator_for_user(user_id)?;
        if operator.skills.is_empty() {
            return Err(ServiceError::precondition_failed(format!(
                "Operator {} has no services assigned",
                operator.name
            )));
        }

        let filter = TicketFilter::new()
            .with_office(&office.id)
            .with_status(TicketStatus::Waiting)
            .with_services(operator.skills.iter().cloned())
            .with_order(TicketOrder::Queue)
            .with_limit(self.candidate_batch as i64);

        for round in 1..=self.max_rounds {
            let candidates = self
                .ctx
                .tickets
                .list(&filter)
                .internal("list_candidates", &office.id)?;
            if candidates.is_empty() {
                break;
            }

            for candidate in &candidates {
                let action = Action::Call {
                    operator_id: operator.id.clone(),
                    service_point_id: point.id.clone(),
                };
                let transition = lifecycle::apply(candidate, &action, self.ctx.clock.now())
                    .internal("call_ticket", &candidate.id)?;

                if self.ctx.commit(&transition)? {
                    metrics::TRANSITIONS
                        .with_label_values(&[transition.ticket.status.as_str()])
                        .inc();
                    info!(
                        ticket_id = %transition.ticket.id,
                        operator_id = %operator.id,
                        service_point_id = %point.id,
                        "Ticket called"
                    );
                    return Ok(Outcome::Ok(self.ctx.view(&transition.ticket)));
                }

                metrics::DISPATCH_LOST_RACES.inc();
                warn!(
                    ticket_id = %candidate.id,
                    operator_id = %operator.id,
                    round,
                    "Candidate taken by another operator, trying next"
                );
            }
        }

        debug!(office_id = %office.id, operator_id = %operator.id, "No ticket available");
        Ok(Outcome::Info(Info::no_ticket_available()))
    }
}
