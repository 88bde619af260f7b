use crate::dtos::AvailableSlotDTO;
use serde::{Deserialize, Serialize};

pub mod get_availability {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, Default)]
    pub struct QueryParams {
        pub days: Option<i64>,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub slots: Vec<AvailableSlotDTO>,
        pub total_available: usize,
    }

    impl APIResponse {
        pub fn new(slots: Vec<AvailableSlotDTO>) -> Self {
            Self {
                total_available: slots.len(),
                slots,
            }
        }
    }
}
