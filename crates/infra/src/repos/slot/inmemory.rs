use super::ISlotRepo;
use crate::repos::shared::inmemory_repo::InMemoryStore;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{CalendarSlot, ID};

pub struct InMemorySlotRepo {
    store: InMemoryStore,
}

impl InMemorySlotRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ISlotRepo for InMemorySlotRepo {
    async fn upsert(&self, slot: &CalendarSlot) -> anyhow::Result<()> {
        self.store.lock().await.upsert_slot(slot);
        Ok(())
    }

    async fn find(&self, coach_id: &ID, start: DateTime<Utc>) -> Option<CalendarSlot> {
        let state = self.store.lock().await;
        state
            .slots
            .iter()
            .find(|s| s.coach_id == *coach_id && s.start == start)
            .cloned()
    }

    async fn find_available(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CalendarSlot>> {
        let state = self.store.lock().await;
        let mut slots = state
            .slots
            .iter()
            .filter(|s| s.available && s.is_within(from, to))
            .cloned()
            .collect::<Vec<_>>();
        slots.sort_by(|a, b| a.start.cmp(&b.start).then(a.coach_id.cmp(&b.coach_id)));
        Ok(slots)
    }

    async fn release(
        &self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let mut state = self.store.lock().await;
        Ok(state.release_slots(coach_id, from, to, now))
    }
}
