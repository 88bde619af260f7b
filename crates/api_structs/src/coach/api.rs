use crate::dtos::CoachDistributionDTO;
use serde::{Deserialize, Serialize};

pub mod get_coach_distribution {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub distribution: Vec<CoachDistributionDTO>,
        pub fairness_score: f64,
    }
}
