use serde::{Deserialize, Serialize};

/// Body of every unsuccessful response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine readable code, e.g. `NO_SLOT_ERROR`
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}
