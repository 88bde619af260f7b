use actix_web::{http::StatusCode, HttpResponse};
use coach_assignment_api_structs::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("{0}")]
    Validation(String),
    /// The auth service rejected the api key
    #[error("{0}")]
    Unauthorized(String),
    /// The auth service could not be reached
    #[error("{message}")]
    Downstream {
        message: String,
        details: Option<String>,
    },
    #[error("{0}")]
    NoSlot(String),
    #[error("{message}")]
    Transaction {
        message: String,
        details: Option<String>,
    },
    /// A CRM or calendar call failed
    #[error("{message}")]
    Gateway {
        message: String,
        details: Option<String>,
    },
    #[error("Request did not complete within {0} seconds")]
    DeadlineExceeded(u64),
    #[error("{message}")]
    InternalError {
        message: String,
        details: Option<String>,
    },
}

impl AssignmentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Unauthorized(_) => "VALIDATION_ERROR",
            Self::Downstream { .. } => "DOWNSTREAM_ERROR",
            Self::NoSlot(_) => "NO_SLOT_ERROR",
            Self::Transaction { .. } => "TRANSACTION_ERROR",
            Self::Gateway { .. } | Self::DeadlineExceeded(_) => "GATEWAY_ERROR",
            Self::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Downstream { details, .. }
            | Self::Transaction { details, .. }
            | Self::Gateway { details, .. }
            | Self::InternalError { details, .. } => details.clone(),
            _ => None,
        }
    }

    pub fn gateway(message: &str, e: impl std::fmt::Display) -> Self {
        Self::Gateway {
            message: message.to_string(),
            details: Some(e.to_string()),
        }
    }

    pub fn internal(message: &str, e: impl std::fmt::Display) -> Self {
        Self::InternalError {
            message: message.to_string(),
            details: Some(e.to_string()),
        }
    }

    pub fn transaction(message: &str, e: impl std::fmt::Display) -> Self {
        Self::Transaction {
            message: message.to_string(),
            details: Some(e.to_string()),
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            error_details: self.details(),
        }
    }
}

impl actix_web::error::ResponseError for AssignmentError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Downstream { .. } | Self::Gateway { .. } => StatusCode::BAD_GATEWAY,
            Self::NoSlot(_) | Self::Transaction { .. } => StatusCode::CONFLICT,
            Self::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_response_body())
    }
}
