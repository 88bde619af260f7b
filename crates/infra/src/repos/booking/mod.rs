mod inmemory;
mod postgres;

use chrono::{DateTime, Utc};
use coach_assignment_domain::{Appointment, Calendar, Coach, DistributionLogEntry, ID};
pub use inmemory::InMemoryBookingRepo;
pub use postgres::PostgresBookingRepo;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingTxError {
    /// A concurrent booking took the slot first, or the transaction could
    /// not be serialized against one.
    #[error("The slot was taken by a concurrent booking")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for BookingTxError {
    fn from(e: sqlx::Error) -> Self {
        // unique_violation and serialization_failure
        let conflict = match &e {
            sqlx::Error::Database(db) => {
                matches!(db.code().as_deref(), Some("23505") | Some("40001"))
            }
            _ => false,
        };
        if conflict {
            Self::Conflict
        } else {
            Self::Storage(e.into())
        }
    }
}

/// Opens serializable booking transactions
#[async_trait::async_trait]
pub trait IBookingRepo: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn IBookingTransaction>, BookingTxError>;
}

/// One serializable unit of work: every read of the eligibility pipeline
/// and every write of the booking happen through it. Dropping it without
/// calling `commit` rolls everything back.
#[async_trait::async_trait]
pub trait IBookingTransaction: Send {
    async fn find_calendar(&mut self, calendar_id: &ID) -> Result<Option<Calendar>, BookingTxError>;
    /// Coaches registered on the calendar, in pool order
    async fn find_coaches_on_calendar(
        &mut self,
        calendar_id: &ID,
    ) -> Result<Vec<Coach>, BookingTxError>;
    async fn count_scheduled_between(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, BookingTxError>;
    /// The slot at `start` exists and is available and no scheduled
    /// appointment of the coach overlaps [start, end)
    async fn is_slot_bookable(
        &mut self,
        coach_id: &ID,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, BookingTxError>;
    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), BookingTxError>;
    async fn mark_slots_unavailable(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, BookingTxError>;
    async fn insert_distribution_log(
        &mut self,
        entry: &DistributionLogEntry,
    ) -> Result<(), BookingTxError>;
    async fn commit(&mut self) -> Result<(), BookingTxError>;
}
