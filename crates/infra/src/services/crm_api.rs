use super::delivery::{is_not_found, DeliveryClient, DeliveryError};
use crate::config::DeliveryConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentCreatedRequest {
    pub appointment_id: String,
    pub coach_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentCreatedResponse {
    #[serde(default)]
    pub success: bool,
    pub crm_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentUpdatedRequest {
    pub appointment_id: String,
    pub coach_id: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentCancelledRequest {
    pub appointment_id: String,
    pub coach_id: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrmContact {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum GetContactError {
    #[error("Contact {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Webhook receiver of the CRM. Every notification carries an idempotency
/// key so retried deliveries are processed once.
#[async_trait::async_trait]
pub trait ICrmClient: Send + Sync {
    async fn notify_created(
        &self,
        req: &AppointmentCreatedRequest,
        idempotency_key: &str,
    ) -> Result<AppointmentCreatedResponse, DeliveryError>;
    async fn notify_updated(
        &self,
        req: &AppointmentUpdatedRequest,
        idempotency_key: &str,
    ) -> Result<(), DeliveryError>;
    async fn notify_cancelled(
        &self,
        req: &AppointmentCancelledRequest,
        idempotency_key: &str,
    ) -> Result<(), DeliveryError>;
    async fn get_contact(&self, contact_id: &str) -> Result<CrmContact, GetContactError>;
}

pub struct CrmRestApi {
    base_url: String,
    delivery: DeliveryClient,
}

impl CrmRestApi {
    pub fn new(base_url: String, delivery: DeliveryClient) -> Self {
        Self { base_url, delivery }
    }

    async fn notify<T: serde::de::DeserializeOwned>(
        &self,
        webhook: &str,
        body: &(impl Serialize + std::fmt::Debug + Sync),
        idempotency_key: &str,
    ) -> Result<T, DeliveryError> {
        self.delivery
            .post(
                &format!("{}/webhooks/{}", self.base_url, webhook),
                body,
                Some(idempotency_key),
                self.delivery.policy(),
            )
            .await
            .map_err(|e| {
                error!(
                    "Failed to deliver {} webhook to CRM with body: {:?}. Error message: {:?}",
                    webhook, body, e
                );
                e
            })
    }
}

#[async_trait::async_trait]
impl ICrmClient for CrmRestApi {
    async fn notify_created(
        &self,
        req: &AppointmentCreatedRequest,
        idempotency_key: &str,
    ) -> Result<AppointmentCreatedResponse, DeliveryError> {
        self.notify("appointment-created", req, idempotency_key).await
    }

    async fn notify_updated(
        &self,
        req: &AppointmentUpdatedRequest,
        idempotency_key: &str,
    ) -> Result<(), DeliveryError> {
        let _: serde::de::IgnoredAny = self
            .notify("appointment-updated", req, idempotency_key)
            .await?;
        Ok(())
    }

    async fn notify_cancelled(
        &self,
        req: &AppointmentCancelledRequest,
        idempotency_key: &str,
    ) -> Result<(), DeliveryError> {
        let _: serde::de::IgnoredAny = self
            .notify("appointment-cancelled", req, idempotency_key)
            .await?;
        Ok(())
    }

    async fn get_contact(&self, contact_id: &str) -> Result<CrmContact, GetContactError> {
        let url = format!("{}/contacts/{}", self.base_url, contact_id);
        match self
            .delivery
            .get(&url, &DeliveryConfig::single_attempt())
            .await
        {
            Ok(contact) => Ok(contact),
            Err(e) if is_not_found(&e) => Err(GetContactError::NotFound(contact_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::spawn_test_server;
    use actix_web::{web, HttpResponse};
    use chrono::TimeZone;
    use std::time::Duration;

    fn crm_api() -> CrmRestApi {
        let base_url = spawn_test_server(|cfg| {
            cfg.route(
                "/contacts/{contact_id}",
                web::get().to(|path: web::Path<String>| async move {
                    match path.as_str() {
                        "c1" => HttpResponse::Ok().json(serde_json::json!({
                            "id": "c1",
                            "email": "jane@example.com",
                            "name": "Jane",
                            "tags": ["trial"]
                        })),
                        "broken" => HttpResponse::InternalServerError().finish(),
                        _ => HttpResponse::NotFound().body("Contact not found"),
                    }
                }),
            );
        });
        CrmRestApi::new(
            base_url,
            DeliveryClient::new(Duration::from_secs(5), DeliveryConfig::single_attempt()),
        )
    }

    #[actix_web::test]
    async fn get_contact_decodes_the_contact() {
        let contact = crm_api().get_contact("c1").await.unwrap();
        assert_eq!(
            contact,
            CrmContact {
                id: "c1".into(),
                email: "jane@example.com".into(),
                name: "Jane".into(),
                phone: None,
                tags: vec!["trial".into()],
            }
        );
    }

    #[actix_web::test]
    async fn unknown_contact_is_not_found() {
        let res = crm_api().get_contact("missing").await;
        match res {
            Err(e @ GetContactError::NotFound(_)) => {
                assert_eq!(e.to_string(), "Contact missing not found")
            }
            other => panic!("Expected contact not found, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn contact_lookup_server_error_is_a_delivery_error() {
        let res = crm_api().get_contact("broken").await;
        assert!(matches!(
            res,
            Err(GetContactError::Delivery(DeliveryError::Exhausted { attempts: 1, .. }))
        ));
    }

    #[test]
    fn created_request_uses_snake_case_fields() {
        let req = AppointmentCreatedRequest {
            appointment_id: "a1".into(),
            coach_id: "c1".into(),
            start_time: Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 5, 6, 10, 30, 0).unwrap(),
            client_id: "user-1".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["appointment_id"], "a1");
        assert_eq!(json["client_id"], "user-1");
        assert_eq!(json["start_time"], "2024-05-06T10:00:00Z");
    }

    #[test]
    fn duplicate_delivery_answer_still_carries_crm_id() {
        let body = serde_json::json!({
            "success": true,
            "message": "Already processed",
            "crm_id": "crm_1"
        });
        let res: AppointmentCreatedResponse = serde_json::from_value(body).unwrap();
        assert_eq!(res.crm_id, "crm_1");
    }
}
