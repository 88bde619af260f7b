use chrono::{DateTime, Utc};
use coach_assignment_domain::{CalendarSlot, ID};
use serde::{Deserialize, Serialize};

/// A free 15 minute slot of one coach
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotDTO {
    pub coach_id: ID,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl AvailableSlotDTO {
    pub fn new(slot: &CalendarSlot) -> Self {
        Self {
            coach_id: slot.coach_id,
            start_time: slot.start,
            end_time: slot.end(),
        }
    }
}
