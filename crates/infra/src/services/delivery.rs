use crate::config::DeliveryConfig;
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

/// Why a single attempt failed in a way that is worth retrying
#[derive(Debug, Error)]
pub enum DeliveryFailure {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Server error. Status: {status}, Body: {body}")]
    ServerError { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request could not be built, nothing was sent
    #[error("Invalid request: {0}")]
    Request(String),
    /// A 4xx answer, never retried
    #[error("Client error. Status: {status}, Body: {body}")]
    ClientError { status: u16, body: String },
    /// An informational or redirect answer that was not followed, never retried
    #[error("Unexpected status: {status}, Body: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Gave up after {attempts} attempts. Last failure: {last}")]
    Exhausted { attempts: u32, last: DeliveryFailure },
    /// A 2xx answer whose body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl DeliveryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ClientError { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            Self::Exhausted {
                last: DeliveryFailure::ServerError { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

/// Delay before retry number `retry` (0 based): `base * 2^retry` plus a
/// random jitter in [0, half of that).
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    let sleep = base.saturating_mul(1_u32 << retry.min(20));
    let half_millis = (sleep.as_millis() / 2) as u64;
    let jitter = if half_millis == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..half_millis)
    };
    sleep + Duration::from_millis(jitter)
}

/// Outbound HTTP with bounded retries.
///
/// Transport failures and 5xx answers are retried with exponential backoff,
/// 2xx answers are decoded as JSON and every other status fails immediately.
/// An empty 2xx body decodes as `null`.
#[derive(Clone)]
pub struct DeliveryClient {
    client: Client,
    policy: DeliveryConfig,
}

impl DeliveryClient {
    pub fn new(http_timeout: Duration, policy: DeliveryConfig) -> Self {
        let client = Client::builder()
            .timeout(http_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Unable to build http client with timeout, using defaults: {:?}", e);
                Client::new()
            });
        Self { client, policy }
    }

    pub fn policy(&self) -> &DeliveryConfig {
        &self.policy
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        policy: &DeliveryConfig,
    ) -> Result<T, DeliveryError> {
        self.deliver(|| self.client.get(url), policy).await
    }

    /// POSTs `body` as JSON. The idempotency key, when given, is sent on
    /// every attempt so the receiver can drop duplicates.
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        idempotency_key: Option<&str>,
        policy: &DeliveryConfig,
    ) -> Result<T, DeliveryError> {
        self.deliver(
            || {
                let req = self.client.post(url).json(body);
                match idempotency_key {
                    Some(key) => req.header(IDEMPOTENCY_KEY_HEADER, key),
                    None => req,
                }
            },
            policy,
        )
        .await
    }

    async fn deliver<T: DeserializeOwned>(
        &self,
        build: impl Fn() -> RequestBuilder,
        policy: &DeliveryConfig,
    ) -> Result<T, DeliveryError> {
        let max_attempts = policy.max_attempts.max(1);
        let mut last = DeliveryFailure::Transport("No attempt made".into());

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(policy.base_delay, attempt - 1);
                info!(
                    "Retrying delivery. Attempt: {}, backoff: {:?}",
                    attempt + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
            }

            let res = match build().send().await {
                Ok(res) => res,
                Err(e) if e.is_builder() => return Err(DeliveryError::Request(e.to_string())),
                Err(e) => {
                    warn!("Delivery attempt {} failed. Network error: {:?}", attempt + 1, e);
                    last = DeliveryFailure::Transport(e.to_string());
                    continue;
                }
            };

            let status = res.status();
            let body = match res.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Delivery attempt {} failed reading body: {:?}", attempt + 1, e);
                    last = DeliveryFailure::Transport(e.to_string());
                    continue;
                }
            };

            if status.is_success() {
                return decode(&body);
            }

            let body = String::from_utf8_lossy(&body).to_string();
            if status.is_server_error() {
                warn!(
                    "Delivery attempt {} failed. Status: {}, Body: {}",
                    attempt + 1,
                    status,
                    body
                );
                last = DeliveryFailure::ServerError {
                    status: status.as_u16(),
                    body,
                };
                continue;
            }

            let status = status.as_u16();
            return Err(if (400..500).contains(&status) {
                DeliveryError::ClientError { status, body }
            } else {
                warn!("Delivery got unexpected status: {}, Body: {}", status, body);
                DeliveryError::UnexpectedStatus { status, body }
            });
        }

        Err(DeliveryError::Exhausted {
            attempts: max_attempts,
            last,
        })
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DeliveryError> {
    let body: &[u8] = if body.iter().all(|b| b.is_ascii_whitespace()) {
        b"null"
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| DeliveryError::Decode(e.to_string()))
}

pub(crate) fn is_not_found(e: &DeliveryError) -> bool {
    e.status() == Some(StatusCode::NOT_FOUND.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use serde::Deserialize;
    use std::sync::Mutex;

    struct Script {
        statuses: Vec<u16>,
        hits: Mutex<Vec<Option<String>>>,
    }

    async fn scripted(req: HttpRequest, script: web::Data<Script>) -> HttpResponse {
        let key = req
            .headers()
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let mut hits = script.hits.lock().unwrap();
        let status = script
            .statuses
            .get(hits.len())
            .copied()
            .unwrap_or(200);
        hits.push(key);

        let status = actix_web::http::StatusCode::from_u16(status).unwrap();
        if status.is_success() {
            HttpResponse::build(status).json(serde_json::json!({ "crm_id": "crm-1" }))
        } else {
            HttpResponse::build(status).body("scripted failure")
        }
    }

    /// Serves POST and GET on `/hook`, answering with the scripted statuses
    /// in order and 200 after the script ran out.
    fn spawn_scripted_server(statuses: Vec<u16>) -> (String, web::Data<Script>) {
        let script = web::Data::new(Script {
            statuses,
            hits: Mutex::new(Vec::new()),
        });
        let data = script.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/hook", web::to(scripted))
        })
        .bind(("127.0.0.1", 0))
        .unwrap();
        let port = server.addrs()[0].port();
        actix_web::rt::spawn(server.workers(1).run());
        (format!("http://127.0.0.1:{}/hook", port), script)
    }

    fn policy(max_attempts: u32) -> DeliveryConfig {
        DeliveryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[derive(Debug, Deserialize)]
    struct Created {
        crm_id: String,
    }

    fn client() -> DeliveryClient {
        DeliveryClient::new(Duration::from_secs(5), policy(3))
    }

    #[actix_web::test]
    async fn retries_server_errors_with_the_same_key() {
        let (url, script) = spawn_scripted_server(vec![503, 503, 200]);

        let res: Created = client()
            .post(&url, &serde_json::json!({}), Some("key-1"), &policy(3))
            .await
            .unwrap();

        assert_eq!(res.crm_id, "crm-1");
        let hits = script.hits.lock().unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|k| k.as_deref() == Some("key-1")));
    }

    #[actix_web::test]
    async fn client_errors_are_not_retried() {
        let (url, script) = spawn_scripted_server(vec![409]);

        let res = client()
            .post::<Created, _>(&url, &serde_json::json!({}), None, &policy(3))
            .await;

        match res {
            Err(DeliveryError::ClientError { status, body }) => {
                assert_eq!(status, 409);
                assert_eq!(body, "scripted failure");
            }
            other => panic!("Expected client error, got {:?}", other),
        }
        assert_eq!(script.hits.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn redirect_answers_are_not_client_errors() {
        let (url, script) = spawn_scripted_server(vec![300]);

        let res = client().get::<Created>(&url, &policy(3)).await;

        match res {
            Err(e @ DeliveryError::UnexpectedStatus { .. }) => {
                assert_eq!(e.status(), Some(300));
                assert!(!is_not_found(&e));
            }
            other => panic!("Expected unexpected status, got {:?}", other),
        }
        assert_eq!(script.hits.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn gives_up_after_max_attempts() {
        let (url, script) = spawn_scripted_server(vec![500, 502, 503, 200]);

        let res = client().get::<Created>(&url, &policy(3)).await;

        match res {
            Err(DeliveryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(
                    last,
                    DeliveryFailure::ServerError { status: 503, .. }
                ));
            }
            other => panic!("Expected exhausted retries, got {:?}", other),
        }
        assert_eq!(script.hits.lock().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn single_attempt_policy_never_retries() {
        let (url, script) = spawn_scripted_server(vec![503]);

        let res = client()
            .get::<Created>(&url, &DeliveryConfig::single_attempt())
            .await;

        assert!(matches!(res, Err(DeliveryError::Exhausted { attempts: 1, .. })));
        assert_eq!(script.hits.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn unreachable_host_is_a_transport_failure() {
        let res = client()
            .get::<Created>("http://127.0.0.1:1/hook", &policy(2))
            .await;

        assert!(matches!(
            res,
            Err(DeliveryError::Exhausted {
                attempts: 2,
                last: DeliveryFailure::Transport(_)
            })
        ));
    }

    #[test]
    fn backoff_doubles_and_adds_bounded_jitter() {
        let base = Duration::from_millis(100);
        for retry in 0..4 {
            let sleep = base * 2_u32.pow(retry);
            let delay = backoff_delay(base, retry);
            assert!(delay >= sleep);
            assert!(delay < sleep + sleep / 2);
        }
        assert_eq!(backoff_delay(Duration::from_millis(0), 3), Duration::from_millis(0));
    }

    #[test]
    fn empty_success_body_decodes_as_null() {
        assert!(decode::<()>(b"").is_ok());
        assert!(decode::<serde_json::Value>(b" \n").unwrap().is_null());
        assert!(matches!(decode::<Created>(b"{}"), Err(DeliveryError::Decode(_))));
    }
}
