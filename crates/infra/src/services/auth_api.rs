use super::delivery::{DeliveryClient, DeliveryError};
use crate::config::DeliveryConfig;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyRateLimit {
    pub limit: i64,
    pub remaining: i64,
    pub reset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyPermissions {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub rate_limit: Option<KeyRateLimit>,
    #[serde(default)]
    pub permissions: Option<KeyPermissions>,
}

impl ValidateResponse {
    pub fn invalid(reason: &str) -> Self {
        Self {
            valid: false,
            error: Some(reason.to_string()),
            key_type: None,
            rate_limit: None,
            permissions: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    api_key: &'a str,
}

/// Decides whether an inbound API key may use the service
#[async_trait::async_trait]
pub trait IAuthValidator: Send + Sync {
    /// `Ok` with `valid == false` means the key was rejected, `Err` means
    /// the auth service could not be asked.
    async fn validate(&self, api_key: &str) -> Result<ValidateResponse, DeliveryError>;
}

pub struct AuthRestApi {
    base_url: String,
    delivery: DeliveryClient,
}

impl AuthRestApi {
    pub fn new(base_url: String, delivery: DeliveryClient) -> Self {
        Self { base_url, delivery }
    }
}

#[async_trait::async_trait]
impl IAuthValidator for AuthRestApi {
    async fn validate(&self, api_key: &str) -> Result<ValidateResponse, DeliveryError> {
        let res = self
            .delivery
            .post(
                &format!("{}/validate", self.base_url),
                &ValidateRequest { api_key },
                None,
                &DeliveryConfig::single_attempt(),
            )
            .await;

        match res {
            Ok(validation) => Ok(validation),
            // Rejections come back as 4xx with a validation body
            Err(DeliveryError::ClientError { status, body }) => {
                match serde_json::from_str::<ValidateResponse>(&body) {
                    Ok(validation) => Ok(validation),
                    Err(_) => {
                        warn!("Auth service rejected key with status {}: {}", status, body);
                        Ok(ValidateResponse::invalid(&body))
                    }
                }
            }
            Err(e) => {
                error!("Failed to validate api key. Error message: {:?}", e);
                Err(e)
            }
        }
    }
}
