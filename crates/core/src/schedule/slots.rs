//! Expansion of open intervals into bookable slot starts.

use chrono::{Duration, NaiveTime};
use tracing::warn;

use super::types::Interval;

/// Hard cap on slots generated from a single interval.
pub const MAX_SLOTS_PER_INTERVAL: usize = 288;

/// Slot start times within `interval`, each slot `slot_length` long.
///
/// A slot is only produced if it ends within the interval. Non-positive
/// lengths and inverted intervals yield nothing.
pub fn slot_starts(interval: Interval, slot_length: Duration) -> Vec<NaiveTime> {
    if slot_length <= Duration::zero() || !interval.is_valid() {
        return Vec::new();
    }

    let mut starts = Vec::new();
    let mut current = interval.start;

    while starts.len() < MAX_SLOTS_PER_INTERVAL {
        let (end, wrapped) = current.overflowing_add_signed(slot_length);
        if wrapped != 0 || end > interval.end {
            break;
        }
        starts.push(current);
        current = end;
    }

    if starts.len() == MAX_SLOTS_PER_INTERVAL {
        warn!(
            start = %interval.start,
            end = %interval.end,
            slot_minutes = slot_length.num_minutes(),
            "Slot generation hit the per-interval cap"
        );
    }

    starts
}
