use super::ISlotRepo;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{CalendarSlot, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresSlotRepo {
    pool: PgPool,
}

impl PostgresSlotRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SlotRaw {
    coach_uid: Uuid,
    start_time: DateTime<Utc>,
    available: bool,
    updated_at: DateTime<Utc>,
}

impl From<SlotRaw> for CalendarSlot {
    fn from(raw: SlotRaw) -> Self {
        Self {
            coach_id: raw.coach_uid.into(),
            start: raw.start_time,
            available: raw.available,
            updated: raw.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl ISlotRepo for PostgresSlotRepo {
    async fn upsert(&self, slot: &CalendarSlot) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO coach_slots(coach_uid, start_time, available, updated_at)
            VALUES($1, $2, $3 AND NOT EXISTS(
                SELECT 1 FROM coach_appointments AS a
                WHERE a.coach_uid = $1
                AND a.status = 'scheduled'
                AND a.start_time <= $2
                AND $2 < a.end_time
            ), $4)
            ON CONFLICT(coach_uid, start_time) DO UPDATE
            SET available = EXCLUDED.available,
            updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(slot.coach_id.inner_ref())
        .bind(slot.start)
        .bind(slot.available)
        .bind(slot.updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, coach_id: &ID, start: DateTime<Utc>) -> Option<CalendarSlot> {
        let res: Option<SlotRaw> = sqlx::query_as(
            r#"
            SELECT * FROM coach_slots AS s
            WHERE s.coach_uid = $1 AND s.start_time = $2
            "#,
        )
        .bind(coach_id.inner_ref())
        .bind(start)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find slot of coach {} at {}: {:?}", coach_id, start, e);
            None
        });
        res.map(|slot| slot.into())
    }

    async fn find_available(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CalendarSlot>> {
        let slots: Vec<SlotRaw> = sqlx::query_as(
            r#"
            SELECT * FROM coach_slots AS s
            WHERE s.available
            AND s.start_time >= $1
            AND s.start_time < $2
            ORDER BY s.start_time, s.coach_uid
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(slots.into_iter().map(|s| s.into()).collect())
    }

    async fn release(
        &self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE coach_slots
            SET available = true,
            updated_at = $4
            WHERE coach_uid = $1
            AND start_time >= $2
            AND start_time < $3
            AND NOT EXISTS(
                SELECT 1 FROM coach_appointments AS a
                WHERE a.coach_uid = $1
                AND a.status = 'scheduled'
                AND a.start_time <= coach_slots.start_time
                AND coach_slots.start_time < a.end_time
            )
            "#,
        )
        .bind(coach_id.inner_ref())
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }
}
