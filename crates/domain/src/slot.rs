use crate::shared::entity::ID;
use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

/// Length of a single `CalendarSlot` in minutes
pub const SLOT_GRANULARITY_MINUTES: i64 = 15;

pub fn slot_granularity() -> Duration {
    Duration::minutes(SLOT_GRANULARITY_MINUTES)
}

/// A fixed length time unit for one `Coach`, keyed by (coach_id, start).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarSlot {
    pub coach_id: ID,
    pub start: DateTime<Utc>,
    pub available: bool,
    pub updated: DateTime<Utc>,
}

impl CalendarSlot {
    pub fn new(coach_id: ID, start: DateTime<Utc>, available: bool, now: DateTime<Utc>) -> Self {
        Self {
            coach_id,
            start: truncate_to_minute(start),
            available,
            updated: now,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + slot_granularity()
    }

    pub fn is_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start >= from && self.start < to
    }
}

/// A free/busy window as reported by the external calendar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

impl AvailabilityWindow {
    /// Start times of every slot this window covers
    pub fn slot_starts(&self) -> Vec<DateTime<Utc>> {
        split_into_slot_starts(self.start, self.end)
    }
}

pub fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::minutes(1)).unwrap_or(ts)
}

/// Decomposes [start, end) into slot start times: start, start + 15m, ... < end.
///
/// `start` is truncated to the minute first, so two windows that only
/// differ in seconds produce the same slots.
pub fn split_into_slot_starts(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::new();
    let mut cursor = truncate_to_minute(start);
    while cursor < end {
        starts.push(cursor);
        cursor = cursor + slot_granularity();
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, s).unwrap()
    }

    #[test]
    fn splits_window_into_quarter_hours() {
        let starts = split_into_slot_starts(ts(9, 0, 0), ts(10, 0, 0));
        assert_eq!(
            starts,
            vec![ts(9, 0, 0), ts(9, 15, 0), ts(9, 30, 0), ts(9, 45, 0)]
        );
    }

    #[test]
    fn partial_trailing_slot_is_kept() {
        let starts = split_into_slot_starts(ts(9, 0, 0), ts(9, 20, 0));
        assert_eq!(starts, vec![ts(9, 0, 0), ts(9, 15, 0)]);
    }

    #[test]
    fn start_is_truncated_to_the_minute() {
        let starts = split_into_slot_starts(ts(9, 0, 42), ts(9, 30, 0));
        assert_eq!(starts, vec![ts(9, 0, 0), ts(9, 15, 0)]);
    }

    #[test]
    fn empty_or_inverted_window_has_no_slots() {
        assert!(split_into_slot_starts(ts(9, 0, 0), ts(9, 0, 0)).is_empty());
        assert!(split_into_slot_starts(ts(10, 0, 0), ts(9, 0, 0)).is_empty());
    }

    #[test]
    fn decomposition_is_deterministic() {
        let window = AvailabilityWindow {
            start: ts(13, 0, 0),
            end: ts(14, 30, 0),
            available: true,
        };
        assert_eq!(window.slot_starts(), window.slot_starts());
        assert_eq!(window.slot_starts().len(), 6);
    }

    #[test]
    fn slot_bounds() {
        let slot = CalendarSlot::new(ID::new(), ts(9, 15, 30), true, ts(8, 0, 0));
        assert_eq!(slot.start, ts(9, 15, 0));
        assert_eq!(slot.end(), ts(9, 30, 0));
        assert!(slot.is_within(ts(9, 0, 0), ts(9, 30, 0)));
        assert!(!slot.is_within(ts(9, 30, 0), ts(10, 0, 0)));
    }
}
