use super::IAppointmentRepo;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{Appointment, AppointmentStatus, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresAppointmentRepo {
    pool: PgPool,
}

impl PostgresAppointmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AppointmentRaw {
    appointment_uid: Uuid,
    coach_uid: Uuid,
    calendar_uid: Uuid,
    contact_id: String,
    title: String,
    notes: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    source: String,
    crm_contact_id: Option<String>,
    external_calendar_id: Option<String>,
    webhook_attempts: i64,
    webhook_last_attempt: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRaw> for Appointment {
    type Error = anyhow::Error;

    fn try_from(raw: AppointmentRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: raw.appointment_uid.into(),
            coach_id: raw.coach_uid.into(),
            calendar_id: raw.calendar_uid.into(),
            contact_id: raw.contact_id,
            title: raw.title,
            notes: raw.notes,
            start: raw.start_time,
            end: raw.end_time,
            status: raw.status.parse::<AppointmentStatus>()?,
            source: raw.source,
            crm_contact_id: raw.crm_contact_id,
            external_calendar_id: raw.external_calendar_id,
            webhook_attempts: raw.webhook_attempts,
            webhook_last_attempt: raw.webhook_last_attempt,
            cancelled_at: raw.cancelled_at,
            confirmed_at: raw.confirmed_at,
            created: raw.created_at,
            updated: raw.updated_at,
        })
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for PostgresAppointmentRepo {
    async fn find(&self, appointment_id: &ID) -> Option<Appointment> {
        let res: Option<AppointmentRaw> = sqlx::query_as(
            r#"
            SELECT * FROM coach_appointments AS a
            WHERE a.appointment_uid = $1
            "#,
        )
        .bind(appointment_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find appointment {}: {:?}", appointment_id, e);
            None
        });

        match res.map(Appointment::try_from) {
            Some(Ok(appointment)) => Some(appointment),
            Some(Err(e)) => {
                error!("Stored appointment {} is corrupt: {:?}", appointment_id, e);
                None
            }
            None => None,
        }
    }

    async fn save(&self, appointment: &Appointment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE coach_appointments
            SET status = $2,
            webhook_attempts = $3,
            webhook_last_attempt = $4,
            cancelled_at = $5,
            confirmed_at = $6,
            updated_at = $7,
            external_calendar_id = $8
            WHERE appointment_uid = $1
            "#,
        )
        .bind(appointment.id.inner_ref())
        .bind(appointment.status.as_str())
        .bind(appointment.webhook_attempts)
        .bind(appointment.webhook_last_attempt)
        .bind(appointment.cancelled_at)
        .bind(appointment.confirmed_at)
        .bind(appointment.updated)
        .bind(&appointment.external_calendar_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_crm_contact_id(
        &self,
        appointment_id: &ID,
        crm_contact_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE coach_appointments
            SET crm_contact_id = $2,
            updated_at = $3
            WHERE appointment_uid = $1
            "#,
        )
        .bind(appointment_id.inner_ref())
        .bind(crm_contact_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_external_calendar_id(
        &self,
        appointment_id: &ID,
        external_calendar_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE coach_appointments
            SET external_calendar_id = $2,
            updated_at = $3
            WHERE appointment_uid = $1
            "#,
        )
        .bind(appointment_id.inner_ref())
        .bind(external_calendar_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_scheduled_between(
        &self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM coach_appointments AS a
            WHERE a.coach_uid = $1
            AND a.status = 'scheduled'
            AND a.start_time >= $2
            AND a.end_time <= $3
            "#,
        )
        .bind(coach_id.inner_ref())
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
