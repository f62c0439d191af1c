//! Background consumer for queue events.
//!
//! Real-time transport is out of scope for this server; events are logged so
//! operators can follow the queue from the service logs.

use cherga_core::{EventEnvelope, QueueEvent};
use tokio::sync::mpsc;
use tracing::info;

/// Consume events until every sender is dropped. Returns the number drained.
pub async fn drain_events(mut rx: mpsc::Receiver<EventEnvelope>) -> u64 {
    let mut drained = 0;
    while let Some(envelope) = rx.recv().await {
        log_event(&envelope);
        drained += 1;
    }
    drained
}

fn log_event(envelope: &EventEnvelope) {
    match &envelope.event {
        QueueEvent::TicketIssued { ticket } => info!(
            event_id = %envelope.id,
            office_id = %envelope.office_id,
            ticket_id = %ticket.id,
            service_id = %ticket.service_id,
            "Queue event: ticket issued"
        ),
        QueueEvent::TicketUpdated {
            ticket,
            previous_status,
        } => info!(
            event_id = %envelope.id,
            office_id = %envelope.office_id,
            ticket_id = %ticket.id,
            from = %previous_status,
            to = %ticket.status,
            "Queue event: ticket updated"
        ),
        QueueEvent::StatsChanged { stats } => info!(
            event_id = %envelope.id,
            office_id = %envelope.office_id,
            waiting = stats.waiting,
            served_today = stats.served_today,
            "Queue event: stats changed"
        ),
    }
}
