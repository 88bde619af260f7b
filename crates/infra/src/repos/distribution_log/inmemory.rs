use super::IDistributionLogRepo;
use crate::repos::shared::inmemory_repo::InMemoryStore;
use coach_assignment_domain::{DistributionLogEntry, ID};

pub struct InMemoryDistributionLogRepo {
    store: InMemoryStore,
}

impl InMemoryDistributionLogRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl IDistributionLogRepo for InMemoryDistributionLogRepo {
    async fn find_by_appointment(&self, appointment_id: &ID) -> Option<DistributionLogEntry> {
        let state = self.store.lock().await;
        state
            .distribution_log
            .iter()
            .find(|e| e.appointment_id == *appointment_id)
            .cloned()
    }
}
