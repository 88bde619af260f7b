use crate::{APIResponse, BaseClient};
use coach_assignment_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct CoachClient {
    base: Arc<BaseClient>,
}

impl CoachClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn distribution(&self) -> APIResponse<get_coach_distribution::APIResponse> {
        self.base
            .get("coaches/distribution".into(), StatusCode::OK)
            .await
    }
}
