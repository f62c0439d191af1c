//! Post-commit notifications for real-time subscribers.

mod sink;
mod types;

pub use sink::{create_event_channel, ChannelEventSink, EventSink, NoopEventSink};
pub use types::{EventEnvelope, QueueEvent, QueueStats, TicketView};
