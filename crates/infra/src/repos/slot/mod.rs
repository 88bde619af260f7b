mod inmemory;
mod postgres;

use chrono::{DateTime, Utc};
use coach_assignment_domain::{CalendarSlot, ID};
pub use inmemory::InMemorySlotRepo;
pub use postgres::PostgresSlotRepo;

#[async_trait::async_trait]
pub trait ISlotRepo: Send + Sync {
    /// Inserts or overwrites the slot keyed by (coach, start). The stored
    /// slot is unavailable whenever a scheduled appointment of the coach
    /// covers its start, regardless of what the caller passed.
    async fn upsert(&self, slot: &CalendarSlot) -> anyhow::Result<()>;
    async fn find(&self, coach_id: &ID, start: DateTime<Utc>) -> Option<CalendarSlot>;
    /// Available slots starting in [from, to), ordered by start then coach
    async fn find_available(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CalendarSlot>>;
    /// Marks the slots of the coach starting in [from, to) available again,
    /// skipping slots covered by a scheduled appointment. Returns the number
    /// of slots touched.
    async fn release(
        &self,
        coach_id: &ID,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64>;
}

#[cfg(test)]
mod tests {
    use crate::AssignmentContext;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use coach_assignment_domain::{
        Appointment, Calendar, CalendarSlot, Coach, NewAppointment,
    };

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    async fn book(ctx: &AssignmentContext, coach: &Coach, start: DateTime<Utc>) -> Appointment {
        let calendar = Calendar::new("Intro calls", 30);
        let appointment = Appointment::scheduled(
            NewAppointment {
                coach_id: coach.id,
                calendar_id: calendar.id,
                contact_id: "contact".into(),
                notes: "",
                start,
                end: calendar.appointment_end(start),
            },
            start,
        );
        let mut tx = ctx.repos.bookings.begin().await.unwrap();
        tx.insert_appointment(&appointment).await.unwrap();
        tx.commit().await.unwrap();
        appointment
    }

    #[tokio::test]
    async fn upsert_overwrites_by_coach_and_start() {
        let ctx = AssignmentContext::create_inmemory();
        let coach = Coach::new("Ada", "ada@example.com", 0.8, 4);

        let slot = CalendarSlot::new(coach.id, at(10, 0), true, at(8, 0));
        ctx.repos.slots.upsert(&slot).await.unwrap();
        let slot = CalendarSlot::new(coach.id, at(10, 0), false, at(9, 0));
        ctx.repos.slots.upsert(&slot).await.unwrap();

        let res = ctx.repos.slots.find(&coach.id, at(10, 0)).await.unwrap();
        assert!(!res.available);
        assert_eq!(res.updated, at(9, 0));
        assert!(ctx
            .repos
            .slots
            .find_available(at(0, 0), at(23, 0))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn upsert_never_reopens_a_booked_slot() {
        let ctx = AssignmentContext::create_inmemory();
        let coach = Coach::new("Ada", "ada@example.com", 0.8, 4);
        book(&ctx, &coach, at(10, 0)).await;

        for start in [at(10, 0), at(10, 15), at(10, 30)] {
            let slot = CalendarSlot::new(coach.id, start, true, at(8, 0));
            ctx.repos.slots.upsert(&slot).await.unwrap();
        }

        assert!(!ctx.repos.slots.find(&coach.id, at(10, 0)).await.unwrap().available);
        assert!(!ctx.repos.slots.find(&coach.id, at(10, 15)).await.unwrap().available);
        assert!(ctx.repos.slots.find(&coach.id, at(10, 30)).await.unwrap().available);
    }

    #[tokio::test]
    async fn available_slots_are_ordered_by_start_then_coach() {
        let ctx = AssignmentContext::create_inmemory();
        let ada = Coach::new("Ada", "ada@example.com", 0.8, 4);
        let bob = Coach::new("Bob", "bob@example.com", 0.9, 4);
        let now = at(8, 0);
        for (coach, start) in [(&ada, at(11, 0)), (&bob, at(10, 0)), (&ada, at(10, 0))] {
            ctx.repos
                .slots
                .upsert(&CalendarSlot::new(coach.id, start, true, now))
                .await
                .unwrap();
        }

        let slots = ctx
            .repos
            .slots
            .find_available(at(10, 0), at(11, 0))
            .await
            .unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.start == at(10, 0)));
        assert!(slots[0].coach_id < slots[1].coach_id);
    }

    #[tokio::test]
    async fn release_reopens_the_range() {
        let ctx = AssignmentContext::create_inmemory();
        let coach = Coach::new("Ada", "ada@example.com", 0.8, 4);
        let now = at(8, 0);
        for start in [at(10, 0), at(10, 15), at(10, 30)] {
            ctx.repos
                .slots
                .upsert(&CalendarSlot::new(coach.id, start, false, now))
                .await
                .unwrap();
        }

        let released = ctx
            .repos
            .slots
            .release(&coach.id, at(10, 0), at(10, 0) + Duration::minutes(30), now)
            .await
            .unwrap();
        assert_eq!(released, 2);
        assert!(ctx.repos.slots.find(&coach.id, at(10, 15)).await.unwrap().available);
        assert!(!ctx.repos.slots.find(&coach.id, at(10, 30)).await.unwrap().available);
    }

    #[tokio::test]
    async fn release_keeps_slots_of_a_scheduled_appointment() {
        let ctx = AssignmentContext::create_inmemory();
        let coach = Coach::new("Ada", "ada@example.com", 0.8, 4);
        let now = at(8, 0);
        for start in [at(10, 0), at(10, 15), at(10, 30)] {
            ctx.repos
                .slots
                .upsert(&CalendarSlot::new(coach.id, start, false, now))
                .await
                .unwrap();
        }
        book(&ctx, &coach, at(10, 0)).await;

        let released = ctx
            .repos
            .slots
            .release(&coach.id, at(10, 0), at(10, 45), now)
            .await
            .unwrap();
        assert_eq!(released, 1);
        assert!(!ctx.repos.slots.find(&coach.id, at(10, 0)).await.unwrap().available);
        assert!(!ctx.repos.slots.find(&coach.id, at(10, 15)).await.unwrap().available);
        assert!(ctx.repos.slots.find(&coach.id, at(10, 30)).await.unwrap().available);
    }
}
