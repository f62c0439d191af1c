//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Issuance (tickets issued, office-closed outcomes, failures)
//! - Sequence counter (claim conflicts, exhausted claims)
//! - Dispatch (call-next results, lost races)
//! - Lifecycle (transitions by target status, service durations)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Issuance Metrics
// =============================================================================

/// Issuance attempts total by result.
pub static TICKETS_ISSUED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cherga_tickets_issued_total", "Total ticket issuance attempts"),
        &["result"], // "issued", "closed", "rejected", "error"
    )
    .unwrap()
});

// =============================================================================
// Sequence Counter Metrics
// =============================================================================

/// Counter claims that lost a race and were retried.
pub static SEQUENCE_CONFLICTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cherga_sequence_conflicts_total",
        "Daily counter claims that hit a write conflict",
    )
    .unwrap()
});

/// Counter claims that gave up after the retry bound.
pub static SEQUENCE_EXHAUSTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cherga_sequence_exhausted_total",
        "Daily counter claims that exhausted their retries",
    )
    .unwrap()
});

/// Attempts needed for a successful claim.
pub static SEQUENCE_ATTEMPTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cherga_sequence_attempts",
            "Attempts needed to claim a sequence number",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 8.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Dispatch Metrics
// =============================================================================

/// Call-next requests by result.
pub static DISPATCH_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cherga_dispatch_results_total", "Total call-next requests"),
        &["result"], // "called", "empty", "rejected", "error"
    )
    .unwrap()
});

/// Candidates lost to a concurrent operator.
pub static DISPATCH_LOST_RACES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cherga_dispatch_lost_races_total",
        "Candidate tickets taken by another operator between read and write",
    )
    .unwrap()
});

// =============================================================================
// Lifecycle Metrics
// =============================================================================

/// Committed status transitions by target status.
pub static TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cherga_ticket_transitions_total",
            "Committed ticket status transitions",
        ),
        &["status"],
    )
    .unwrap()
});

/// Time spent serving a visitor, in minutes.
pub static SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cherga_service_duration_minutes",
            "Actual service time of completed tickets",
        )
        .buckets(vec![1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0]),
        &["service"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Issuance
        Box::new(TICKETS_ISSUED.clone()),
        // Sequence
        Box::new(SEQUENCE_CONFLICTS.clone()),
        Box::new(SEQUENCE_EXHAUSTED.clone()),
        Box::new(SEQUENCE_ATTEMPTS.clone()),
        // Dispatch
        Box::new(DISPATCH_RESULTS.clone()),
        Box::new(DISPATCH_LOST_RACES.clone()),
        // Lifecycle
        Box::new(TRANSITIONS.clone()),
        Box::new(SERVICE_DURATION.clone()),
    ]
}
