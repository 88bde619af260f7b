mod inmemory;
mod postgres;

use chrono::{DateTime, Utc};
use coach_assignment_domain::IdempotencyRecord;
pub use inmemory::InMemoryIdempotencyRepo;
pub use postgres::PostgresIdempotencyRepo;

/// Key value store of responses already produced for an idempotency key
#[async_trait::async_trait]
pub trait IIdempotencyRepo: Send + Sync {
    /// Returns the record unless it is missing or expired at `now`
    async fn get(&self, key: &str, now: DateTime<Utc>) -> anyhow::Result<Option<IdempotencyRecord>>;
    /// Stores the record, replacing any previous one with the same key
    async fn set(&self, record: &IdempotencyRecord) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use crate::AssignmentContext;
    use chrono::{Duration, TimeZone, Utc};
    use coach_assignment_domain::IdempotencyRecord;

    #[tokio::test]
    async fn records_expire_after_a_day() {
        let ctx = AssignmentContext::create_inmemory();
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let record = IdempotencyRecord::new("webhook:1".into(), "{}".into(), now);
        ctx.repos.idempotency.set(&record).await.unwrap();

        let res = ctx
            .repos
            .idempotency
            .get("webhook:1", now + Duration::hours(23))
            .await
            .unwrap();
        assert_eq!(res, Some(record));
        assert!(ctx
            .repos
            .idempotency
            .get("webhook:1", now + Duration::hours(25))
            .await
            .unwrap()
            .is_none());
        assert!(ctx.repos.idempotency.get("webhook:2", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let ctx = AssignmentContext::create_inmemory();
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let first = IdempotencyRecord::new("booking:k".into(), "first".into(), now);
        let second = IdempotencyRecord::new("booking:k".into(), "second".into(), now);
        ctx.repos.idempotency.set(&first).await.unwrap();
        ctx.repos.idempotency.set(&second).await.unwrap();

        let res = ctx.repos.idempotency.get("booking:k", now).await.unwrap().unwrap();
        assert_eq!(res.response, "second");
    }
}
