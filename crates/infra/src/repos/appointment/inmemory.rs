use super::IAppointmentRepo;
use crate::repos::shared::inmemory_repo::InMemoryStore;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{Appointment, ID};

pub struct InMemoryAppointmentRepo {
    store: InMemoryStore,
}

impl InMemoryAppointmentRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for InMemoryAppointmentRepo {
    async fn find(&self, appointment_id: &ID) -> Option<Appointment> {
        let state = self.store.lock().await;
        state
            .appointments
            .iter()
            .find(|a| a.id == *appointment_id)
            .cloned()
    }

    async fn save(&self, appointment: &Appointment) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        match state.find_appointment_mut(&appointment.id) {
            Some(existing) => {
                *existing = appointment.clone();
                Ok(())
            }
            None => anyhow::bail!("Appointment with id: {} not found", appointment.id),
        }
    }

    async fn set_crm_contact_id(
        &self,
        appointment_id: &ID,
        crm_contact_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        if let Some(appointment) = state.find_appointment_mut(appointment_id) {
            appointment.crm_contact_id = Some(crm_contact_id.to_string());
            appointment.updated = now;
        }
        Ok(())
    }

    async fn set_external_calendar_id(
        &self,
        appointment_id: &ID,
        external_calendar_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        if let Some(appointment) = state.find_appointment_mut(appointment_id) {
            appointment.external_calendar_id = Some(external_calendar_id.to_string());
            appointment.updated = now;
        }
        Ok(())
    }

    async fn count_scheduled_between(
        &self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        Ok(self
            .store
            .lock()
            .await
            .count_scheduled_between(coach_id, from, to))
    }
}
