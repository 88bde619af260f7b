use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State changes the external calendar can push to us
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    AppointmentCancelled,
    AppointmentConfirmed,
    /// Accepted and acknowledged without side effects
    Other(String),
}

impl WebhookEventType {
    pub fn parse(event_type: &str) -> Self {
        match event_type {
            "appointment.cancelled" => Self::AppointmentCancelled,
            "appointment.confirmed" => Self::AppointmentConfirmed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AppointmentCancelled => "appointment.cancelled",
            Self::AppointmentConfirmed => "appointment.confirmed",
            Self::Other(other) => other,
        }
    }
}

/// Raw record of an inbound webhook, stored whether or not processing succeeds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookEvent {
    pub id: ID,
    pub event_type: String,
    pub source: String,
    pub payload: serde_json::Value,
    pub last_attempt: DateTime<Utc>,
    pub processed: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn received(id: ID, event_type: &str, payload: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id,
            event_type: event_type.to_string(),
            source: "webhook".into(),
            payload,
            last_attempt: now,
            processed: now,
            created: now,
        }
    }
}

impl Entity<ID> for WebhookEvent {
    fn id(&self) -> ID {
        self.id
    }
}
