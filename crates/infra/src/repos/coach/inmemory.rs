use super::ICoachRepo;
use crate::repos::shared::inmemory_repo::InMemoryStore;
use coach_assignment_domain::{Coach, ID};

pub struct InMemoryCoachRepo {
    store: InMemoryStore,
}

impl InMemoryCoachRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ICoachRepo for InMemoryCoachRepo {
    async fn insert(&self, coach: &Coach) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        if state.coaches.iter().any(|c| c.id == coach.id) {
            anyhow::bail!("Coach with id: {} already exists", coach.id);
        }
        state.coaches.push(coach.clone());
        Ok(())
    }

    async fn find(&self, coach_id: &ID) -> Option<Coach> {
        let state = self.store.lock().await;
        state.coaches.iter().find(|c| c.id == *coach_id).cloned()
    }

    async fn find_all(&self) -> anyhow::Result<Vec<Coach>> {
        Ok(self.store.lock().await.coaches.clone())
    }
}
