mod appointment;
mod booking;
mod calendar;
mod coach;
mod distribution_log;
mod idempotency;
mod shared;
mod slot;
mod webhook_event;

pub use appointment::IAppointmentRepo;
use appointment::{InMemoryAppointmentRepo, PostgresAppointmentRepo};
pub use booking::{BookingTxError, IBookingRepo, IBookingTransaction};
use booking::{InMemoryBookingRepo, PostgresBookingRepo};
pub use calendar::ICalendarRepo;
use calendar::{InMemoryCalendarRepo, PostgresCalendarRepo};
pub use coach::ICoachRepo;
use coach::{InMemoryCoachRepo, PostgresCoachRepo};
pub use distribution_log::IDistributionLogRepo;
use distribution_log::{InMemoryDistributionLogRepo, PostgresDistributionLogRepo};
pub use idempotency::IIdempotencyRepo;
use idempotency::{InMemoryIdempotencyRepo, PostgresIdempotencyRepo};
pub use slot::ISlotRepo;
use slot::{InMemorySlotRepo, PostgresSlotRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
pub use webhook_event::IWebhookEventRepo;
use webhook_event::{InMemoryWebhookEventRepo, PostgresWebhookEventRepo};

#[derive(Clone)]
pub struct Repos {
    pub coaches: Arc<dyn ICoachRepo>,
    pub calendars: Arc<dyn ICalendarRepo>,
    pub slots: Arc<dyn ISlotRepo>,
    pub appointments: Arc<dyn IAppointmentRepo>,
    pub bookings: Arc<dyn IBookingRepo>,
    pub distribution_log: Arc<dyn IDistributionLogRepo>,
    pub webhook_events: Arc<dyn IWebhookEventRepo>,
    pub idempotency: Arc<dyn IIdempotencyRepo>,
}

impl Repos {
    pub async fn create_postgres(
        connection_string: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            coaches: Arc::new(PostgresCoachRepo::new(pool.clone())),
            calendars: Arc::new(PostgresCalendarRepo::new(pool.clone())),
            slots: Arc::new(PostgresSlotRepo::new(pool.clone())),
            appointments: Arc::new(PostgresAppointmentRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
            distribution_log: Arc::new(PostgresDistributionLogRepo::new(pool.clone())),
            webhook_events: Arc::new(PostgresWebhookEventRepo::new(pool.clone())),
            idempotency: Arc::new(PostgresIdempotencyRepo::new(pool)),
        })
    }

    /// Every in-memory repo shares one store, so a booking transaction
    /// sees and isolates the writes of all of them.
    pub fn create_inmemory() -> Self {
        let store = shared::inmemory_repo::new_store();
        Self {
            coaches: Arc::new(InMemoryCoachRepo::new(store.clone())),
            calendars: Arc::new(InMemoryCalendarRepo::new(store.clone())),
            slots: Arc::new(InMemorySlotRepo::new(store.clone())),
            appointments: Arc::new(InMemoryAppointmentRepo::new(store.clone())),
            bookings: Arc::new(InMemoryBookingRepo::new(store.clone())),
            distribution_log: Arc::new(InMemoryDistributionLogRepo::new(store.clone())),
            webhook_events: Arc::new(InMemoryWebhookEventRepo::new(store.clone())),
            idempotency: Arc::new(InMemoryIdempotencyRepo::new(store)),
        }
    }
}
