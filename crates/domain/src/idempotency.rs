use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a stored response is replayed for
pub const IDEMPOTENCY_TTL_HOURS: i64 = 24;

/// A previously produced response body, keyed by a client supplied idempotency key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdempotencyRecord {
    pub key: String,
    pub response: String,
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(key: String, response: String, now: DateTime<Utc>) -> Self {
        Self {
            key,
            response,
            expires_at: now + Duration::hours(IDEMPOTENCY_TTL_HOURS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
