use std::time::Duration;
use tracing::{info, warn};

/// Retry policy of the outbound delivery loop
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Upper bound of attempts, including the first one
    pub max_attempts: u32,
    /// Backoff before retry `n` is `base_delay * 2^n` plus jitter
    pub base_delay: Duration,
}

impl DeliveryConfig {
    /// Used by calls that are never retried
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    pub calendar_api_url: String,
    pub crm_webhook_url: String,
    pub auth_service_url: String,
    pub delivery: DeliveryConfig,
    /// Timeout of every single outbound http call
    pub http_timeout: Duration,
    /// Deadline for handling one inbound request, downstream calls included
    pub request_timeout: Duration,
    /// Requests per minute a client is allowed to make. Advertised to
    /// clients, enforced at the edge.
    pub rate_limit_per_minute: u32,
    /// Lookahead used by availability sync when the caller gives none
    pub default_lookahead_days: i64,
}

fn env_or_default(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) => val,
        Err(_) => {
            info!(
                "Did not find {} environment variable. Falling back to: {}",
                key, default
            );
            default.to_string()
        }
    }
}

fn parse_env_or_default<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    let val = match std::env::var(key) {
        Ok(val) => val,
        Err(_) => return default,
    };
    match val.parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(
                "The given {}: {} is not valid, falling back to the default value: {}.",
                key, val, default
            );
            default
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let port = parse_env_or_default("PORT", 5000_usize);
        let max_attempts = parse_env_or_default("WEBHOOK_RETRY_ATTEMPTS", 3_u32).max(1);
        let base_delay_millis = parse_env_or_default("WEBHOOK_RETRY_DELAY_MS", 1000_u64);

        Self {
            port,
            calendar_api_url: env_or_default("CALENDAR_API_URL", "http://localhost:3001"),
            crm_webhook_url: env_or_default("CRM_WEBHOOK_URL", "http://localhost:3002"),
            auth_service_url: env_or_default("AUTH_SERVICE_URL", "http://localhost:3003"),
            delivery: DeliveryConfig {
                max_attempts,
                base_delay: Duration::from_millis(base_delay_millis),
            },
            http_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            rate_limit_per_minute: parse_env_or_default("RATE_LIMIT_PER_MINUTE", 100_u32),
            default_lookahead_days: 7,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
