use super::{BookingTxError, IBookingRepo, IBookingTransaction};
use crate::repos::{calendar::CalendarRaw, coach::CoachRaw};
use chrono::{DateTime, Utc};
use coach_assignment_domain::{Appointment, Calendar, Coach, DistributionLogEntry, ID};
use sqlx::{types::Uuid, PgConnection, PgPool, Postgres, Transaction};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IBookingRepo for PostgresBookingRepo {
    async fn begin(&self) -> Result<Box<dyn IBookingTransaction>, BookingTxError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PostgresBookingTransaction { tx: Some(tx) }))
    }
}

/// Rolled back by sqlx when dropped uncommitted
struct PostgresBookingTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresBookingTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection, BookingTxError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(anyhow::anyhow!("Booking transaction already committed").into()),
        }
    }
}

#[async_trait::async_trait]
impl IBookingTransaction for PostgresBookingTransaction {
    async fn find_calendar(&mut self, calendar_id: &ID) -> Result<Option<Calendar>, BookingTxError> {
        let res: Option<CalendarRaw> = sqlx::query_as(
            r#"
            SELECT * FROM calendars AS c
            WHERE c.calendar_uid = $1
            "#,
        )
        .bind(calendar_id.inner_ref())
        .fetch_optional(self.conn()?)
        .await?;
        Ok(res.map(|calendar| calendar.into()))
    }

    async fn find_coaches_on_calendar(
        &mut self,
        calendar_id: &ID,
    ) -> Result<Vec<Coach>, BookingTxError> {
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
        .fetch_all(self.conn()?)
        .await?;
        Ok(coaches.into_iter().map(|c| c.into()).collect())
    }

    async fn count_scheduled_between(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, BookingTxError> {
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
        .fetch_one(self.conn()?)
        .await?;
        Ok(count)
    }

    async fn is_slot_bookable(
        &mut self,
        coach_id: &ID,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, BookingTxError> {
        let bookable: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM coach_slots AS s
                WHERE s.coach_uid = $1
                AND s.start_time = $2
                AND s.available
            ) AND NOT EXISTS(
                SELECT 1 FROM coach_appointments AS a
                WHERE a.coach_uid = $1
                AND a.status = 'scheduled'
                AND a.start_time < $3
                AND $2 < a.end_time
            )
            "#,
        )
        .bind(coach_id.inner_ref())
        .bind(start)
        .bind(end)
        .fetch_one(self.conn()?)
        .await?;
        Ok(bookable)
    }

    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), BookingTxError> {
        sqlx::query(
            r#"
            INSERT INTO coach_appointments(
                appointment_uid, coach_uid, calendar_uid, contact_id, title, notes,
                start_time, end_time, status, source, created_at, updated_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(appointment.id.inner_ref())
        .bind(appointment.coach_id.inner_ref())
        .bind(appointment.calendar_id.inner_ref())
        .bind(&appointment.contact_id)
        .bind(&appointment.title)
        .bind(&appointment.notes)
        .bind(appointment.start)
        .bind(appointment.end)
        .bind(appointment.status.as_str())
        .bind(&appointment.source)
        .bind(appointment.created)
        .bind(appointment.updated)
        .execute(self.conn()?)
        .await?;
        Ok(())
    }

    async fn mark_slots_unavailable(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, BookingTxError> {
        let res = sqlx::query(
            r#"
            UPDATE coach_slots
            SET available = false,
            updated_at = $4
            WHERE coach_uid = $1
            AND start_time >= $2
            AND start_time < $3
            "#,
        )
        .bind(coach_id.inner_ref())
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(self.conn()?)
        .await?;
        Ok(res.rows_affected())
    }

    async fn insert_distribution_log(
        &mut self,
        entry: &DistributionLogEntry,
    ) -> Result<(), BookingTxError> {
        let considered = entry
            .coaches_considered
            .iter()
            .map(|id| *id.inner_ref())
            .collect::<Vec<Uuid>>();
        sqlx::query(
            r#"
            INSERT INTO distribution_log(
                entry_uid, appointment_uid, coaches_considered, selected_coach_uid,
                selection_reason, distribution_score, created_at
            )
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id.inner_ref())
        .bind(entry.appointment_id.inner_ref())
        .bind(&considered)
        .bind(entry.selected_coach_id.inner_ref())
        .bind(&entry.selection_reason)
        .bind(entry.distribution_score)
        .bind(entry.created)
        .execute(self.conn()?)
        .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BookingTxError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(anyhow::anyhow!("Booking transaction already committed").into()),
        }
    }
}
