use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// The daily window in which a `Coach` takes appointments.
///
/// Times are wall-clock times anchored to the appointment's calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Absolute bounds of the working window on the given day
    pub fn window_on(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            day.and_time(self.start).and_utc(),
            day.and_time(self.end).and_utc(),
        )
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// A member of the coach pool that appointments are assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coach {
    pub id: ID,
    pub name: String,
    pub email: String,
    /// Fitness score used to pick between several eligible coaches
    pub score: f64,
    pub max_daily_appointments: i64,
    pub working_hours: WorkingHours,
    pub timezone: String,
}

impl Coach {
    pub fn new(name: &str, email: &str, score: f64, max_daily_appointments: i64) -> Self {
        Self {
            id: Default::default(),
            name: name.to_string(),
            email: email.to_string(),
            score,
            max_daily_appointments,
            working_hours: Default::default(),
            timezone: "UTC".into(),
        }
    }

    /// Whether `booked` appointments on a day still leave room for one more
    pub fn has_capacity(&self, booked: i64) -> bool {
        booked < self.max_daily_appointments
    }
}

impl Entity<ID> for Coach {
    fn id(&self) -> ID {
        self.id
    }
}
