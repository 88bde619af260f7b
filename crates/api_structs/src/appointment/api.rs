use crate::dtos::AppointmentDTO;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod book_appointment {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, Clone)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub calendar_id: String,
        pub start_time: DateTime<Utc>,
        #[serde(default)]
        pub notes: String,
        #[serde(default)]
        pub contact_email: Option<String>,
        #[serde(default)]
        pub contact_name: Option<String>,
        #[serde(default)]
        pub timezone: Option<String>,
    }

    pub type APIResponse = AppointmentDTO;
}
