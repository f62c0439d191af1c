//! Queue tickets: entity, storage and the status state machine.

pub mod lifecycle;
mod sqlite_store;
mod store;
mod types;

pub use lifecycle::{Action, Effect, Transition, TransitionError};
pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketFilter, TicketOrder, TicketStore};
pub use types::{compose_ticket_id, format_number, Ticket, TicketStatus};
