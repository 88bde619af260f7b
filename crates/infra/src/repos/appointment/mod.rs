mod inmemory;
mod postgres;

use chrono::{DateTime, Utc};
use coach_assignment_domain::{Appointment, ID};
pub use inmemory::InMemoryAppointmentRepo;
pub use postgres::PostgresAppointmentRepo;

/// Appointments are only ever inserted by a booking transaction, see
/// `IBookingRepo`.
#[async_trait::async_trait]
pub trait IAppointmentRepo: Send + Sync {
    async fn find(&self, appointment_id: &ID) -> Option<Appointment>;
    /// Persists the status, webhook bookkeeping and calendar block of the
    /// appointment
    async fn save(&self, appointment: &Appointment) -> anyhow::Result<()>;
    async fn set_crm_contact_id(
        &self,
        appointment_id: &ID,
        crm_contact_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    async fn set_external_calendar_id(
        &self,
        appointment_id: &ID,
        external_calendar_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    /// Scheduled appointments of the coach lying entirely within [from, to]
    async fn count_scheduled_between(
        &self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<i64>;
}
