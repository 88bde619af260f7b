use crate::{APIResponse, BaseClient, ID};
use coach_assignment_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct WebhookClient {
    base: Arc<BaseClient>,
}

pub struct CalendarWebhookInput {
    pub event_type: String,
    pub appointment_id: ID,
    pub idempotency_key: String,
}

impl WebhookClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn send_calendar_event(
        &self,
        input: CalendarWebhookInput,
    ) -> APIResponse<handle_calendar_webhook::APIResponse> {
        let body = handle_calendar_webhook::RequestBody {
            event_type: input.event_type,
            appointment_id: input.appointment_id.to_string(),
        };
        self.base
            .post(
                body,
                "webhooks/calendar".into(),
                Some(&input.idempotency_key),
                StatusCode::OK,
            )
            .await
    }
}
