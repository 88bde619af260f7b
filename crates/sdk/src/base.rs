use coach_assignment_api_structs::ErrorResponse;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-api-key";
const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

pub(crate) struct BaseClient {
    address: String,
    api_key: Option<String>,
}

#[derive(Debug)]
pub enum APIError {
    Network,
    MalformedResponse,
    /// The server rejected the request with a structured error body
    Rejected {
        status: StatusCode,
        body: ErrorResponse,
    },
    UnexpectedStatusCode(StatusCode),
}

impl APIError {
    /// Machine readable error code of a rejected request
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { body, .. } => Some(&body.error),
            _ => None,
        }
    }
}

pub type APIResponse<T> = Result<T, APIError>;

impl BaseClient {
    pub fn new(address: String) -> Self {
        Self {
            address,
            api_key: None,
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    fn get_client(
        &self,
        method: Method,
        path: String,
        idempotency_key: Option<&str>,
    ) -> RequestBuilder {
        let client = Client::new();
        let url = format!("{}/{}", self.address, path);
        let mut builder = client.request(method, &url);

        if let Some(api_key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, api_key.clone());
        }
        if let Some(key) = idempotency_key {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        builder
    }

    async fn handle_api_response<T: for<'de> Deserialize<'de>>(
        &self,
        res: Response,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let status = res.status();
        if status != expected_status_code {
            return match res.json::<ErrorResponse>().await {
                Ok(body) => Err(APIError::Rejected { status, body }),
                Err(_) => Err(APIError::UnexpectedStatusCode(status)),
            };
        }
        res.json::<T>()
            .await
            .map_err(|_| APIError::MalformedResponse)
    }

    pub async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: String,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self.get_client(Method::GET, path, None).send().await {
            Ok(res) => res,
            Err(_) => return Err(APIError::Network),
        };
        self.handle_api_response(res, expected_status_code).await
    }

    pub async fn post<T: for<'de> Deserialize<'de>, S: Serialize>(
        &self,
        body: S,
        path: String,
        idempotency_key: Option<&str>,
        expected_status_code: StatusCode,
    ) -> APIResponse<T> {
        let res = match self
            .get_client(Method::POST, path, idempotency_key)
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(_) => return Err(APIError::Network),
        };
        self.handle_api_response(res, expected_status_code).await
    }
}
