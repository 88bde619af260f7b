use crate::error::AssignmentError;
use crate::shared::guard::Guard;
use actix_web::HttpRequest;
use coach_assignment_infra::{
    auth_api::{ValidateResponse, API_KEY_HEADER},
    AssignmentContext,
};
use tracing::warn;

/// Authenticates the caller by its `X-API-Key` header. A missing key is
/// rejected before any downstream call is made.
pub async fn protect_route(
    http_req: &HttpRequest,
    ctx: &AssignmentContext,
) -> Result<ValidateResponse, AssignmentError> {
    let api_key = Guard::required_header(http_req, API_KEY_HEADER)?;

    let validation = ctx.services.auth.validate(&api_key).await.map_err(|e| {
        AssignmentError::Downstream {
            message: "Unable to reach the auth service".into(),
            details: Some(e.to_string()),
        }
    })?;

    if !validation.valid {
        warn!("Rejected request with invalid api key");
        return Err(AssignmentError::Unauthorized(
            validation
                .error
                .clone()
                .unwrap_or_else(|| "Invalid API key".into()),
        ));
    }

    Ok(validation)
}
