use crate::{APIResponse, BaseClient, ID};
use chrono::{DateTime, Utc};
use coach_assignment_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppointmentClient {
    base: Arc<BaseClient>,
}

pub struct BookAppointmentInput {
    pub calendar_id: ID,
    pub start_time: DateTime<Utc>,
    pub notes: String,
    pub idempotency_key: Option<String>,
}

impl AppointmentClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn book(
        &self,
        input: BookAppointmentInput,
    ) -> APIResponse<book_appointment::APIResponse> {
        let body = book_appointment::RequestBody {
            calendar_id: input.calendar_id.to_string(),
            start_time: input.start_time,
            notes: input.notes,
            contact_email: None,
            contact_name: None,
            timezone: None,
        };
        self.base
            .post(
                body,
                "appointments".into(),
                input.idempotency_key.as_deref(),
                StatusCode::CREATED,
            )
            .await
    }
}
