use crate::repos::booking::BookingTxError;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{
    Appointment, Calendar, CalendarSlot, Coach, DistributionLogEntry, IdempotencyRecord,
    WebhookEvent, ID,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Every table of the in-memory store.
///
/// All in-memory repositories share one `InMemoryState` behind a single
/// lock, so a booking transaction can lock it for its whole lifetime.
#[derive(Debug, Clone, Default)]
pub struct InMemoryState {
    pub coaches: Vec<Coach>,
    pub calendars: Vec<Calendar>,
    /// (calendar_id, coach_id)
    pub coach_calendars: Vec<(ID, ID)>,
    pub slots: Vec<CalendarSlot>,
    pub appointments: Vec<Appointment>,
    pub distribution_log: Vec<DistributionLogEntry>,
    pub webhook_events: Vec<WebhookEvent>,
    pub idempotency: HashMap<String, IdempotencyRecord>,
}

pub type InMemoryStore = Arc<Mutex<InMemoryState>>;

pub fn new_store() -> InMemoryStore {
    Arc::new(Mutex::new(InMemoryState::default()))
}

impl InMemoryState {
    pub fn find_calendar(&self, calendar_id: &ID) -> Option<Calendar> {
        self.calendars.iter().find(|c| c.id == *calendar_id).cloned()
    }

    /// Coaches registered on the calendar, in pool order
    pub fn coaches_on_calendar(&self, calendar_id: &ID) -> Vec<Coach> {
        self.coaches
            .iter()
            .filter(|coach| {
                self.coach_calendars
                    .iter()
                    .any(|(cal_id, coach_id)| cal_id == calendar_id && *coach_id == coach.id)
            })
            .cloned()
            .collect()
    }

    pub fn count_scheduled_between(
        &self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> i64 {
        self.appointments
            .iter()
            .filter(|a| {
                a.coach_id == *coach_id && a.is_scheduled() && a.start >= from && a.end <= to
            })
            .count() as i64
    }

    fn has_scheduled_overlapping(&self, coach_id: &ID, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.appointments
            .iter()
            .any(|a| a.coach_id == *coach_id && a.is_scheduled() && a.overlaps(start, end))
    }

    pub fn is_slot_bookable(&self, coach_id: &ID, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let slot_open = self
            .slots
            .iter()
            .any(|s| s.coach_id == *coach_id && s.start == start && s.available);
        slot_open && !self.has_scheduled_overlapping(coach_id, start, end)
    }

    pub fn insert_appointment(
        &mut self,
        appointment: &Appointment,
    ) -> Result<(), BookingTxError> {
        let taken = self.appointments.iter().any(|a| {
            a.id == appointment.id
                || (a.is_scheduled()
                    && a.coach_id == appointment.coach_id
                    && a.start == appointment.start)
        });
        if taken {
            return Err(BookingTxError::Conflict);
        }
        self.appointments.push(appointment.clone());
        Ok(())
    }

    pub fn set_slots_availability(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        available: bool,
        now: DateTime<Utc>,
    ) -> u64 {
        let mut affected = 0;
        for slot in self
            .slots
            .iter_mut()
            .filter(|s| s.coach_id == *coach_id && s.is_within(from, to))
        {
            slot.available = available;
            slot.updated = now;
            affected += 1;
        }
        affected
    }

    /// Reopens the coach's slots starting in [from, to), except those still
    /// covered by a scheduled appointment
    pub fn release_slots(
        &mut self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> u64 {
        let covered = self
            .slots
            .iter()
            .filter(|s| s.coach_id == *coach_id && s.is_within(from, to))
            .filter(|s| {
                self.appointments
                    .iter()
                    .any(|a| a.coach_id == *coach_id && a.is_scheduled() && a.covers(s.start))
            })
            .map(|s| s.start)
            .collect::<Vec<_>>();

        let mut affected = 0;
        for slot in self.slots.iter_mut().filter(|s| {
            s.coach_id == *coach_id && s.is_within(from, to) && !covered.contains(&s.start)
        }) {
            slot.available = true;
            slot.updated = now;
            affected += 1;
        }
        affected
    }

    /// Inserts or overwrites the slot. A slot covered by a scheduled
    /// appointment is always written as unavailable.
    pub fn upsert_slot(&mut self, slot: &CalendarSlot) {
        let covered = self
            .appointments
            .iter()
            .any(|a| a.coach_id == slot.coach_id && a.is_scheduled() && a.covers(slot.start));
        let mut slot = slot.clone();
        slot.available = slot.available && !covered;

        match self
            .slots
            .iter_mut()
            .find(|s| s.coach_id == slot.coach_id && s.start == slot.start)
        {
            Some(existing) => *existing = slot,
            None => self.slots.push(slot),
        }
    }

    pub fn find_appointment_mut(&mut self, appointment_id: &ID) -> Option<&mut Appointment> {
        self.appointments.iter_mut().find(|a| a.id == *appointment_id)
    }
}
