use crate::{APIResponse, BaseClient};
use coach_assignment_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct AvailabilityClient {
    base: Arc<BaseClient>,
}

impl AvailabilityClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    /// Syncs availability and lists open slots. `None` uses the server's
    /// default lookahead.
    pub async fn get(&self, days: Option<i64>) -> APIResponse<get_availability::APIResponse> {
        let path = match days {
            Some(days) => format!("availability?days={}", days),
            None => "availability".into(),
        };
        self.base.get(path, StatusCode::OK).await
    }
}
