mod inmemory;
mod postgres;

use coach_assignment_domain::{DistributionLogEntry, ID};
pub use inmemory::InMemoryDistributionLogRepo;
pub use postgres::PostgresDistributionLogRepo;

/// Read side of the distribution log, entries are written by the booking
/// transaction.
#[async_trait::async_trait]
pub trait IDistributionLogRepo: Send + Sync {
    async fn find_by_appointment(&self, appointment_id: &ID) -> Option<DistributionLogEntry>;
}

#[cfg(test)]
mod tests {
    use crate::AssignmentContext;
    use chrono::{TimeZone, Utc};
    use coach_assignment_domain::{DistributionLogEntry, ID};

    #[tokio::test]
    async fn committed_entries_are_found_by_appointment() {
        let ctx = AssignmentContext::create_inmemory();
        let entry = DistributionLogEntry {
            id: ID::new(),
            appointment_id: ID::new(),
            coaches_considered: vec![ID::new(), ID::new()],
            selected_coach_id: ID::new(),
            selection_reason: "Selected coach with highest score".into(),
            distribution_score: 0.9,
            created: Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap(),
        };
        let mut tx = ctx.repos.bookings.begin().await.unwrap();
        tx.insert_distribution_log(&entry).await.unwrap();
        tx.commit().await.unwrap();

        let res = ctx
            .repos
            .distribution_log
            .find_by_appointment(&entry.appointment_id)
            .await
            .unwrap();
        assert_eq!(res, entry);
        assert!(ctx
            .repos
            .distribution_log
            .find_by_appointment(&ID::new())
            .await
            .is_none());
    }
}
