use super::ICalendarRepo;
use crate::repos::coach::CoachRaw;
use coach_assignment_domain::{Calendar, Coach, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresCalendarRepo {
    pool: PgPool,
}

impl PostgresCalendarRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct CalendarRaw {
    calendar_uid: Uuid,
    name: String,
    slot_duration: i64,
}

impl From<CalendarRaw> for Calendar {
    fn from(raw: CalendarRaw) -> Self {
        Self {
            id: raw.calendar_uid.into(),
            name: raw.name,
            slot_duration: raw.slot_duration,
        }
    }
}

#[async_trait::async_trait]
impl ICalendarRepo for PostgresCalendarRepo {
    async fn insert(&self, calendar: &Calendar) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO calendars(calendar_uid, name, slot_duration)
            VALUES($1, $2, $3)
            "#,
        )
        .bind(calendar.id.inner_ref())
        .bind(&calendar.name)
        .bind(calendar.slot_duration)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, calendar_id: &ID) -> Option<Calendar> {
        let res: Option<CalendarRaw> = sqlx::query_as(
            r#"
            SELECT * FROM calendars AS c
            WHERE c.calendar_uid = $1
            "#,
        )
        .bind(calendar_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find calendar {}: {:?}", calendar_id, e);
            None
        });
        res.map(|calendar| calendar.into())
    }

    async fn add_coach(&self, calendar_id: &ID, coach_id: &ID) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO coach_calendars(calendar_uid, coach_uid)
            VALUES($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(calendar_id.inner_ref())
        .bind(coach_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_coaches(&self, calendar_id: &ID) -> anyhow::Result<Vec<Coach>> {
        let coaches: Vec<CoachRaw> = sqlx::query_as(
            r#"
            SELECT c.* FROM coaches AS c
            INNER JOIN coach_calendars AS cc
                ON cc.coach_uid = c.coach_uid
            WHERE cc.calendar_uid = $1
            ORDER BY c.coach_seq
            "#,
        )
        .bind(calendar_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;
        Ok(coaches.into_iter().map(|c| c.into()).collect())
    }
}
