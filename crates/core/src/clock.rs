//! Source of the current instant.
//!
//! Every time-dependent decision (office hours, ticket timestamps, the
//! counter's calendar day) reads the clock through this trait so tests can
//! pin time with [`crate::testing::ManualClock`].

use chrono::{DateTime, Utc};

/// Provides the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
