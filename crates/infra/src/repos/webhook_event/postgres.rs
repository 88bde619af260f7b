use super::IWebhookEventRepo;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{WebhookEvent, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresWebhookEventRepo {
    pool: PgPool,
}

impl PostgresWebhookEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WebhookEventRaw {
    event_uid: Uuid,
    event_type: String,
    source: String,
    payload: serde_json::Value,
    last_attempt: DateTime<Utc>,
    processed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<WebhookEventRaw> for WebhookEvent {
    fn from(raw: WebhookEventRaw) -> Self {
        Self {
            id: raw.event_uid.into(),
            event_type: raw.event_type,
            source: raw.source,
            payload: raw.payload,
            last_attempt: raw.last_attempt,
            processed: raw.processed_at,
            created: raw.created_at,
        }
    }
}

#[async_trait::async_trait]
impl IWebhookEventRepo for PostgresWebhookEventRepo {
    async fn insert(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_events(event_uid, event_type, source, payload, last_attempt, processed_at, created_at)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id.inner_ref())
        .bind(&event.event_type)
        .bind(&event.source)
        .bind(&event.payload)
        .bind(event.last_attempt)
        .bind(event.processed)
        .bind(event.created)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<WebhookEvent> {
        let res: Option<WebhookEventRaw> = sqlx::query_as(
            r#"
            SELECT * FROM webhook_events AS w
            WHERE w.event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find webhook event {}: {:?}", event_id, e);
            None
        });
        res.map(|event| event.into())
    }
}
