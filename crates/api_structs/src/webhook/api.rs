use serde::{Deserialize, Serialize};

pub mod handle_calendar_webhook {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, Clone)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub event_type: String,
        pub appointment_id: String,
    }

    #[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub received: bool,
        pub event_id: String,
    }

    impl APIResponse {
        pub fn new(event_id: String) -> Self {
            Self {
                received: true,
                event_id,
            }
        }
    }
}
