//! Per-office, per-day ticket sequence numbers.
//!
//! Numbers are claimed with optimistic retries over a conditional write;
//! there is no in-process lock, so several replicas can share one store.

mod counter;
mod sqlite;
mod store;

pub use counter::{RetryPolicy, SequenceCounter, SequenceError};
pub use sqlite::SqliteCounterStore;
pub use store::{ClaimResult, CounterError, CounterStore};
