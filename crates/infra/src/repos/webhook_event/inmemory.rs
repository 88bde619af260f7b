use super::IWebhookEventRepo;
use crate::repos::shared::inmemory_repo::InMemoryStore;
use coach_assignment_domain::{WebhookEvent, ID};

pub struct InMemoryWebhookEventRepo {
    store: InMemoryStore,
}

impl InMemoryWebhookEventRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl IWebhookEventRepo for InMemoryWebhookEventRepo {
    async fn insert(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        if state.webhook_events.iter().any(|e| e.id == event.id) {
            anyhow::bail!("Webhook event with id: {} already exists", event.id);
        }
        state.webhook_events.push(event.clone());
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> Option<WebhookEvent> {
        let state = self.store.lock().await;
        state.webhook_events.iter().find(|e| e.id == *event_id).cloned()
    }
}
