//! Daily counter storage trait.

use chrono::NaiveDate;
use thiserror::Error;

/// Error type for counter storage.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Result of a conditional counter write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// The write was applied and is durable.
    Committed,
    /// Another writer got there first; nothing was written.
    Conflict,
}

/// Storage for daily counters keyed by `(office_id, date)`.
///
/// Both writes are conditional: they must report [`ClaimResult::Conflict`]
/// instead of overwriting a row another writer has changed.
pub trait CounterStore: Send + Sync {
    /// Current `last_number` for the key, if the row exists.
    fn get(&self, office_id: &str, date: NaiveDate) -> Result<Option<u32>, CounterError>;

    /// Create the row with `last_number = first`; conflicts if it already exists.
    fn try_create(
        &self,
        office_id: &str,
        date: NaiveDate,
        first: u32,
    ) -> Result<ClaimResult, CounterError>;

    /// Set `last_number = next` only if it still equals `expected`.
    fn compare_and_set(
        &self,
        office_id: &str,
        date: NaiveDate,
        expected: u32,
        next: u32,
    ) -> Result<ClaimResult, CounterError>;
}
