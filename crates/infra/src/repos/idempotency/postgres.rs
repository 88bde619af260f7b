use super::IIdempotencyRepo;
use chrono::{DateTime, Utc};
use coach_assignment_domain::IdempotencyRecord;
use sqlx::{FromRow, PgPool};

pub struct PostgresIdempotencyRepo {
    pool: PgPool,
}

impl PostgresIdempotencyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IdempotencyRaw {
    key: String,
    response: String,
    expires_at: DateTime<Utc>,
}

impl From<IdempotencyRaw> for IdempotencyRecord {
    fn from(raw: IdempotencyRaw) -> Self {
        Self {
            key: raw.key,
            response: raw.response,
            expires_at: raw.expires_at,
        }
    }
}

#[async_trait::async_trait]
impl IIdempotencyRepo for PostgresIdempotencyRepo {
    async fn get(&self, key: &str, now: DateTime<Utc>) -> anyhow::Result<Option<IdempotencyRecord>> {
        let res: Option<IdempotencyRaw> = sqlx::query_as(
            r#"
            SELECT * FROM idempotency_records AS i
            WHERE i.key = $1 AND i.expires_at > $2
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(res.map(|record| record.into()))
    }

    async fn set(&self, record: &IdempotencyRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO idempotency_records(key, response, expires_at)
            VALUES($1, $2, $3)
            ON CONFLICT(key) DO UPDATE
            SET response = EXCLUDED.response,
            expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&record.key)
        .bind(&record.response)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
