use super::ICalendarRepo;
use crate::repos::shared::inmemory_repo::InMemoryStore;
use coach_assignment_domain::{Calendar, Coach, ID};

pub struct InMemoryCalendarRepo {
    store: InMemoryStore,
}

impl InMemoryCalendarRepo {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ICalendarRepo for InMemoryCalendarRepo {
    async fn insert(&self, calendar: &Calendar) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        if state.calendars.iter().any(|c| c.id == calendar.id) {
            anyhow::bail!("Calendar with id: {} already exists", calendar.id);
        }
        state.calendars.push(calendar.clone());
        Ok(())
    }

    async fn find(&self, calendar_id: &ID) -> Option<Calendar> {
        self.store.lock().await.find_calendar(calendar_id)
    }

    async fn add_coach(&self, calendar_id: &ID, coach_id: &ID) -> anyhow::Result<()> {
        let mut state = self.store.lock().await;
        let entry = (*calendar_id, *coach_id);
        if !state.coach_calendars.contains(&entry) {
            state.coach_calendars.push(entry);
        }
        Ok(())
    }

    async fn find_coaches(&self, calendar_id: &ID) -> anyhow::Result<Vec<Coach>> {
        Ok(self.store.lock().await.coaches_on_calendar(calendar_id))
    }
}
