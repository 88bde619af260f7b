use super::ICoachRepo;
use chrono::NaiveTime;
use coach_assignment_domain::{Coach, WorkingHours, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresCoachRepo {
    pool: PgPool,
}

impl PostgresCoachRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct CoachRaw {
    coach_uid: Uuid,
    name: String,
    email: String,
    score: f64,
    max_daily_appointments: i64,
    working_hours_start: NaiveTime,
    working_hours_end: NaiveTime,
    timezone: String,
}

impl From<CoachRaw> for Coach {
    fn from(raw: CoachRaw) -> Self {
        Self {
            id: raw.coach_uid.into(),
            name: raw.name,
            email: raw.email,
            score: raw.score,
            max_daily_appointments: raw.max_daily_appointments,
            working_hours: WorkingHours::new(raw.working_hours_start, raw.working_hours_end),
            timezone: raw.timezone,
        }
    }
}

#[async_trait::async_trait]
impl ICoachRepo for PostgresCoachRepo {
    async fn insert(&self, coach: &Coach) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO coaches(coach_uid, name, email, score, max_daily_appointments, working_hours_start, working_hours_end, timezone)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(coach.id.inner_ref())
        .bind(&coach.name)
        .bind(&coach.email)
        .bind(coach.score)
        .bind(coach.max_daily_appointments)
        .bind(coach.working_hours.start)
        .bind(coach.working_hours.end)
        .bind(&coach.timezone)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, coach_id: &ID) -> Option<Coach> {
        let res: Option<CoachRaw> = sqlx::query_as(
            r#"
            SELECT * FROM coaches AS c
            WHERE c.coach_uid = $1
            "#,
        )
        .bind(coach_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find coach {}: {:?}", coach_id, e);
            None
        });
        res.map(|coach| coach.into())
    }

    async fn find_all(&self) -> anyhow::Result<Vec<Coach>> {
        let coaches: Vec<CoachRaw> = sqlx::query_as(
            r#"
            SELECT * FROM coaches AS c
            ORDER BY c.coach_seq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(coaches.into_iter().map(|c| c.into()).collect())
    }
}
