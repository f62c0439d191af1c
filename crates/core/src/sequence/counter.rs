//! Optimistic daily sequence claims.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::{ClaimResult, CounterError, CounterStore};
use crate::config::SequenceConfig;
use crate::metrics;

/// Error type for sequence claims.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Every attempt lost a race with another writer.
    #[error("Could not claim a sequence number for office {office_id} on {date} after {attempts} attempts")]
    Exhausted {
        office_id: String,
        date: NaiveDate,
        attempts: u32,
    },

    /// The day's counter cannot grow any further.
    #[error("Sequence for office {office_id} on {date} is exhausted")]
    Overflow { office_id: String, date: NaiveDate },

    #[error(transparent)]
    Store(#[from] CounterError),
}

/// Bounded retry with capped linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): `min(step * attempt, max)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_step
            .checked_mul(attempt)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&SequenceConfig::default())
    }
}

impl From<&SequenceConfig> for RetryPolicy {
    fn from(config: &SequenceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_step: config.backoff_step(),
            max_backoff: config.max_backoff(),
        }
    }
}

/// Hands out 1-based, gapless numbers per `(office, date)`.
///
/// A number is returned only after the store committed it.
#[derive(Clone)]
pub struct SequenceCounter {
    store: Arc<dyn CounterStore>,
    policy: RetryPolicy,
}

impl SequenceCounter {
    pub fn new(store: Arc<dyn CounterStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Claim the next number for `office_id` on `date`.
    pub async fn next_sequence(
        &self,
        office_id: &str,
        date: NaiveDate,
    ) -> Result<u32, SequenceError> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let (candidate, result) = match self.store.get(office_id, date)? {
                None => (1, self.store.try_create(office_id, date, 1)?),
                Some(last) => {
                    let next = last.checked_add(1).ok_or_else(|| SequenceError::Overflow {
                        office_id: office_id.to_string(),
                        date,
                    })?;
                    (next, self.store.compare_and_set(office_id, date, last, next)?)
                }
            };

            match result {
                ClaimResult::Committed => {
                    metrics::SEQUENCE_ATTEMPTS
                        .with_label_values(&[])
                        .observe(f64::from(attempt));
                    debug!(office_id, %date, sequence = candidate, attempt, "Claimed sequence number");
                    return Ok(candidate);
                }
                ClaimResult::Conflict => {
                    metrics::SEQUENCE_CONFLICTS.inc();
                    warn!(
                        office_id,
                        %date,
                        candidate,
                        attempt,
                        max_attempts = attempts,
                        "Sequence claim conflicted, retrying"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff_for(attempt)).await;
                    }
                }
            }
        }

        metrics::SEQUENCE_EXHAUSTED.inc();
        error!(office_id, %date, attempts, "Sequence claim retries exhausted");
        Err(SequenceError::Exhausted {
            office_id: office_id.to_string(),
            date,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_step: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_backoff_is_linear_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(300));
        assert_eq!(policy.backoff_for(50), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_first_claim_of_day_is_one() {
        let store = Arc::new(MemoryStore::new());
        let counter = SequenceCounter::new(store.clone(), fast_policy(5));

        assert_eq!(counter.next_sequence("office-1", day()).await.unwrap(), 1);
        assert_eq!(counter.next_sequence("office-1", day()).await.unwrap(), 2);
        assert_eq!(counter.next_sequence("office-1", day()).await.unwrap(), 3);
        assert_eq!(store.counter_value("office-1", day()), Some(3));
    }

    #[test]
    fn test_claims_are_scoped_per_office() {
        let store = Arc::new(MemoryStore::new());
        let counter = SequenceCounter::new(store, fast_policy(5));

        assert_eq!(tokio_test::block_on(counter.next_sequence("office-1", day())).unwrap(), 1);
        assert_eq!(tokio_test::block_on(counter.next_sequence("office-2", day())).unwrap(), 1);
        assert_eq!(tokio_test::block_on(counter.next_sequence("office-1", day())).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_new_day_restarts_at_one() {
        let store = Arc::new(MemoryStore::new());
        let counter = SequenceCounter::new(store, fast_policy(5));

        counter.next_sequence("office-1", day()).await.unwrap();
        counter.next_sequence("office-1", day()).await.unwrap();
        let tomorrow = day().succ_opt().unwrap();
        assert_eq!(counter.next_sequence("office-1", tomorrow).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_conflicts_are_retried() {
        let store = Arc::new(MemoryStore::new());
        let counter = SequenceCounter::new(store.clone(), fast_policy(5));
        counter.next_sequence("office-1", day()).await.unwrap();

        store.fail_next_counter_writes(3);
        assert_eq!(counter.next_sequence("office-1", day()).await.unwrap(), 2);
        assert_eq!(store.counter_value("office-1", day()), Some(2));
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_error_and_commits_nothing() {
        let store = Arc::new(MemoryStore::new());
        let counter = SequenceCounter::new(store.clone(), fast_policy(3));

        store.fail_next_counter_writes(3);
        let err = counter.next_sequence("office-1", day()).await.unwrap_err();
        assert!(matches!(err, SequenceError::Exhausted { attempts: 3, .. }));
        assert_eq!(store.counter_value("office-1", day()), None);

        // The store recovers; the next claim is still 1.
        assert_eq!(counter.next_sequence("office-1", day()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_claims_form_a_permutation() {
        let store = Arc::new(MemoryStore::new());
        let counter = SequenceCounter::new(store.clone(), fast_policy(50));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let counter = counter.clone();
                tokio::spawn(async move { counter.next_sequence("office-1", day()).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap());
        }
        numbers.sort_unstable();

        assert_eq!(numbers, (1..=20).collect::<Vec<u32>>());
        assert_eq!(store.counter_value("office-1", day()), Some(20));
    }
}
