use crate::error::AssignmentError;
use actix_web::HttpRequest;
use coach_assignment_domain::ID;

pub struct Guard {}

impl Guard {
    pub fn against_malformed_id(val: &str, field: &str) -> Result<ID, AssignmentError> {
        val.parse()
            .map_err(|e| AssignmentError::Validation(format!("Invalid {}: {}", field, e)))
    }

    /// Value of the header, if present and not blank
    pub fn optional_header(http_req: &HttpRequest, name: &str) -> Option<String> {
        http_req
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn required_header(http_req: &HttpRequest, name: &str) -> Result<String, AssignmentError> {
        Self::optional_header(http_req, name)
            .ok_or_else(|| AssignmentError::Validation(format!("Missing {} header", name)))
    }
}
