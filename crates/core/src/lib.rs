//! Ticket issuance and dispatch engine for walk-in service queues.
//!
//! Offices publish schedules; visitors take numbered tickets at a kiosk;
//! operators call the next eligible ticket to their service point and move
//! it through its lifecycle.

pub mod clock;
pub mod config;
pub mod directory;
pub mod events;
pub mod metrics;
pub mod schedule;
pub mod sequence;
pub mod service;
pub mod testing;
pub mod ticket;

pub use clock::{Clock, SystemClock};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use directory::{Directory, DirectoryError, SqliteDirectory};
pub use events::{create_event_channel, EventEnvelope, EventSink, QueueEvent};
pub use schedule::{Schedule, ScheduleOracle};
pub use sequence::{RetryPolicy, SequenceCounter, SequenceError, SqliteCounterStore};
pub use service::{
    DispatchService, DisplayService, ErrorKind, IssuanceService, LifecycleService, Outcome,
    QueueContext, ServiceError, ServiceResult,
};
pub use ticket::{SqliteTicketStore, Ticket, TicketError, TicketStatus, TicketStore};
