mod inmemory;
mod postgres;

use coach_assignment_domain::{WebhookEvent, ID};
pub use inmemory::InMemoryWebhookEventRepo;
pub use postgres::PostgresWebhookEventRepo;

#[async_trait::async_trait]
pub trait IWebhookEventRepo: Send + Sync {
    async fn insert(&self, event: &WebhookEvent) -> anyhow::Result<()>;
    async fn find(&self, event_id: &ID) -> Option<WebhookEvent>;
}
