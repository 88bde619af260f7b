use chrono::{DateTime, Utc};
use coach_assignment_domain::{Appointment, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDTO {
    pub appointment_id: ID,
    pub coach_id: ID,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
}

impl AppointmentDTO {
    pub fn new(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            coach_id: appointment.coach_id,
            start_time: appointment.start,
            end_time: appointment.end,
            status: appointment.status.to_string(),
        }
    }
}
