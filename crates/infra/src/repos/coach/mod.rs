mod inmemory;
mod postgres;

use coach_assignment_domain::{Coach, ID};
pub use inmemory::InMemoryCoachRepo;
pub(crate) use postgres::CoachRaw;
pub use postgres::PostgresCoachRepo;

#[async_trait::async_trait]
pub trait ICoachRepo: Send + Sync {
    async fn insert(&self, coach: &Coach) -> anyhow::Result<()>;
    async fn find(&self, coach_id: &ID) -> Option<Coach>;
    /// The whole coach pool, in the order coaches were added
    async fn find_all(&self) -> anyhow::Result<Vec<Coach>>;
}
