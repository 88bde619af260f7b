use super::IIdempotencyRepo;
use crate::repos::shared::inmemory_repo::InMemoryStore;
use chrono::{DateTime, Utc};
use coach_assignment_domain::IdempotencyRecord;

pub struct InMemoryIdempotencyRepo {
    store: InMemoryStore,
}

impl InMemoryIdempotencyRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl IIdempotencyRepo for InMemoryIdempotencyRepo {
    async fn get(&self, key: &str, now: DateTime<Utc>) -> anyhow::Result<Option<IdempotencyRecord>> {
        let state = self.store.lock().await;
        Ok(state
            .idempotency
            .get(key)
            .filter(|record| !record.is_expired(now))
            .cloned())
    }

    async fn set(&self, record: &IdempotencyRecord) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        state.idempotency.insert(record.key.clone(), record.clone());
        Ok(())
    }
}
