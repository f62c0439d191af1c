//! Sequence counter integration tests over a shared SQLite file.
//!
//! Several store handles (separate connections) race for the same counter
//! key the way separate server replicas would.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use tempfile::TempDir;

use cherga_core::sequence::{CounterStore, RetryPolicy, SequenceCounter, SqliteCounterStore};

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff_step: Duration::from_millis(1),
        max_backoff: Duration::from_millis(10),
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_replicas_claim_distinct_contiguous_numbers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("counters.db");

    // Each claim can lose at most once per competing winner.
    let claims = 24;
    let counters: Vec<SequenceCounter> = (0..3)
        .map(|_| {
            let store = SqliteCounterStore::new(&db_path).expect("Failed to open counter store");
            SequenceCounter::new(Arc::new(store), policy(claims))
        })
        .collect();

    let handles = (0..claims as usize).map(|i| {
        let counter = counters[i % counters.len()].clone();
        tokio::spawn(async move { counter.next_sequence("office-1", day()).await })
    });

    let mut numbers: Vec<u32> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("claim failed"))
        .collect();
    numbers.sort_unstable();

    assert_eq!(numbers, (1..=claims).collect::<Vec<u32>>());

    let reader = SqliteCounterStore::new(&db_path).unwrap();
    assert_eq!(reader.get("office-1", day()).unwrap(), Some(claims));
}

#[tokio::test]
async fn test_counters_are_isolated_per_office_and_date() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("counters.db");
    let counter = SequenceCounter::new(
        Arc::new(SqliteCounterStore::new(&db_path).unwrap()),
        policy(5),
    );

    assert_eq!(counter.next_sequence("office-1", day()).await.unwrap(), 1);
    assert_eq!(counter.next_sequence("office-1", day()).await.unwrap(), 2);
    assert_eq!(counter.next_sequence("office-2", day()).await.unwrap(), 1);
    assert_eq!(
        counter
            .next_sequence("office-1", day().succ_opt().unwrap())
            .await
            .unwrap(),
        1
    );

    // A fresh handle sees the persisted values.
    let reopened = SequenceCounter::new(
        Arc::new(SqliteCounterStore::new(&db_path).unwrap()),
        policy(5),
    );
    assert_eq!(reopened.next_sequence("office-1", day()).await.unwrap(), 3);
}
