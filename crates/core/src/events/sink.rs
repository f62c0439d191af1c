//! Event sinks: where committed queue events are sent.

use tokio::sync::mpsc;

use super::EventEnvelope;

/// Receives events after the corresponding store write committed.
///
/// Publishing never fails the caller.
pub trait EventSink: Send + Sync {
    fn publish(&self, envelope: EventEnvelope);
}

/// Sink that forwards events to a bounded channel
///
/// This is cheaply cloneable and can be shared across tasks. If the channel
/// is full or closed the event is dropped and the error is logged.
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: mpsc::Sender<EventEnvelope>,
}

impl ChannelEventSink {
    /// Create a new sink from a channel sender
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Try to forward an event without blocking
    ///
    /// Returns true if the event was sent successfully, false otherwise.
    pub fn try_forward(&self, envelope: EventEnvelope) -> bool {
        let event_type = envelope.event.event_type();
        let office_id = envelope.office_id.clone();
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(event_type, office_id, "Failed to publish queue event: {}", e);
                false
            }
        }
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, envelope: EventEnvelope) {
        self.try_forward(envelope);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _envelope: EventEnvelope) {}
}

/// Create a channel-backed sink and the receiver to drain it from.
pub fn create_event_channel(capacity: usize) -> (ChannelEventSink, mpsc::Receiver<EventEnvelope>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelEventSink::new(tx), rx)
}
