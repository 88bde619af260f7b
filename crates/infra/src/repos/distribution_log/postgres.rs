use super::IDistributionLogRepo;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{DistributionLogEntry, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresDistributionLogRepo {
    pool: PgPool,
}

impl PostgresDistributionLogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DistributionLogRaw {
    entry_uid: Uuid,
    appointment_uid: Uuid,
    coaches_considered: Vec<Uuid>,
    selected_coach_uid: Uuid,
    selection_reason: String,
    distribution_score: f64,
    created_at: DateTime<Utc>,
}

impl From<DistributionLogRaw> for DistributionLogEntry {
    fn from(raw: DistributionLogRaw) -> Self {
        Self {
            id: raw.entry_uid.into(),
            appointment_id: raw.appointment_uid.into(),
            coaches_considered: raw.coaches_considered.into_iter().map(|id| id.into()).collect(),
            selected_coach_id: raw.selected_coach_uid.into(),
            selection_reason: raw.selection_reason,
            distribution_score: raw.distribution_score,
            created: raw.created_at,
        }
    }
}

#[async_trait::async_trait]
impl IDistributionLogRepo for PostgresDistributionLogRepo {
    async fn find_by_appointment(&self, appointment_id: &ID) -> Option<DistributionLogEntry> {
        let res: Option<DistributionLogRaw> = sqlx::query_as(
            r#"
            SELECT * FROM distribution_log AS d
            WHERE d.appointment_uid = $1
            "#,
        )
        .bind(appointment_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!(
                "Unable to find distribution log of appointment {}: {:?}",
                appointment_id, e
            );
            None
        });
        res.map(|entry| entry.into())
    }
}
