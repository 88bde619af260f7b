use super::{BookingTxError, IBookingRepo, IBookingTransaction};
use crate::repos::shared::inmemory_repo::{InMemoryState, InMemoryStore};
use chrono::{DateTime, Utc};
use coach_assignment_domain::{Appointment, Calendar, Coach, DistributionLogEntry, ID};
use tokio::sync::OwnedMutexGuard;

pub struct InMemoryBookingRepo {
    store: InMemoryStore,
}

impl InMemoryBookingRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl IBookingRepo for InMemoryBookingRepo {
    async fn begin(&self) -> Result<Box<dyn IBookingTransaction>, BookingTxError> {
        let guard = self.store.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryBookingTransaction {
            guard: Some(guard),
            staged,
        }))
    }
}

/// Holds the store lock until dropped, so transactions run one at a time.
/// Writes go to `staged` and only reach the store on commit.
struct InMemoryBookingTransaction {
    guard: Option<OwnedMutexGuard<InMemoryState>>,
    staged: InMemoryState,
}

#[async_trait::async_trait]
impl IBookingTransaction for InMemoryBookingTransaction {
    async fn find_calendar(&mut self, calendar_id: &ID) -> Result<Option<Calendar>, BookingTxError> {
        Ok(self.staged.find_calendar(calendar_id))
    }

    async fn find_coaches_on_calendar(
        &mut self,
        calendar_id: &ID,
    ) -> Result<Vec<Coach>, BookingTxError> {
        Ok(self.staged.coaches_on_calendar(calendar_id))
    }

    async fn count_scheduled_between(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, BookingTxError> {
        Ok(self.staged.count_scheduled_between(coach_id, from, to))
    }

    async fn is_slot_bookable(
        &mut self,
        coach_id: &ID,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, BookingTxError> {
        Ok(self.staged.is_slot_bookable(coach_id, start, end))
    }

    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), BookingTxError> {
        self.staged.insert_appointment(appointment)
    }

    async fn mark_slots_unavailable(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, BookingTxError> {
        Ok(self
            .staged
            .set_slots_availability(coach_id, from, to, false, now))
    }

    async fn insert_distribution_log(
        &mut self,
        entry: &DistributionLogEntry,
    ) -> Result<(), BookingTxError> {
        self.staged.distribution_log.push(entry.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BookingTxError> {
        match self.guard.take() {
            Some(mut guard) => {
                *guard = std::mem::take(&mut self.staged);
                Ok(())
            }
            None => Err(anyhow::anyhow!("Booking transaction already committed").into()),
        }
    }
}
