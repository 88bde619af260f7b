use serde::{Deserialize, Serialize};

pub mod get_service_health {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    pub struct APIResponse {
        pub message: String,
    }

    impl APIResponse {
        pub fn healthy() -> Self {
            Self {
                message: "Coach assignment service is running".into(),
            }
        }
    }
}
