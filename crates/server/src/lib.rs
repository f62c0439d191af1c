//! HTTP boundary for the queue engine.

pub mod api;
pub mod events;
pub mod metrics;
pub mod state;
