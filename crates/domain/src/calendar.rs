use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A bookable calendar shared by a set of coaches.
///
/// Every appointment booked through a `Calendar` lasts `slot_duration` minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Calendar {
    pub id: ID,
    pub name: String,
    /// Duration in minutes
    pub slot_duration: i64,
}

impl Calendar {
    pub fn new(name: &str, slot_duration: i64) -> Self {
        Self {
            id: Default::default(),
            name: name.to_string(),
            slot_duration,
        }
    }

    pub fn appointment_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + Duration::minutes(self.slot_duration)
    }
}

impl Entity<ID> for Calendar {
    fn id(&self) -> ID {
        self.id
    }
}
