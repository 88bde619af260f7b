mod inmemory;
mod postgres;

use coach_assignment_domain::{Calendar, Coach, ID};
pub use inmemory::InMemoryCalendarRepo;
pub(crate) use postgres::CalendarRaw;
pub use postgres::PostgresCalendarRepo;

#[async_trait::async_trait]
pub trait ICalendarRepo: Send + Sync {
    async fn insert(&self, calendar: &Calendar) -> anyhow::Result<()>;
    async fn find(&self, calendar_id: &ID) -> Option<Calendar>;
    /// Registers the coach as bookable through the calendar
    async fn add_coach(&self, calendar_id: &ID, coach_id: &ID) -> anyhow::Result<()>;
    async fn find_coaches(&self, calendar_id: &ID) -> anyhow::Result<Vec<Coach>>;
}

#[cfg(test)]
mod tests {
    use crate::AssignmentContext;
    use coach_assignment_domain::{Calendar, Coach};

    #[tokio::test]
    async fn insert_and_find() {
        let ctx = AssignmentContext::create_inmemory();
        let calendar = Calendar::new("Intro calls", 30);

        assert!(ctx.repos.calendars.insert(&calendar).await.is_ok());
        let res = ctx.repos.calendars.find(&calendar.id).await.unwrap();
        assert_eq!(res, calendar);
        assert!(ctx.repos.calendars.find(&Default::default()).await.is_none());
    }

    #[tokio::test]
    async fn only_registered_coaches_are_on_the_calendar() {
        let ctx = AssignmentContext::create_inmemory();
        let calendar = Calendar::new("Intro calls", 30);
        let other_calendar = Calendar::new("Follow ups", 60);
        let ada = Coach::new("Ada", "ada@example.com", 0.8, 4);
        let bob = Coach::new("Bob", "bob@example.com", 0.9, 4);
        for c in [&calendar, &other_calendar] {
            ctx.repos.calendars.insert(c).await.unwrap();
        }
        for c in [&ada, &bob] {
            ctx.repos.coaches.insert(c).await.unwrap();
        }
        ctx.repos.calendars.add_coach(&calendar.id, &ada.id).await.unwrap();
        ctx.repos.calendars.add_coach(&other_calendar.id, &bob.id).await.unwrap();

        let coaches = ctx.repos.calendars.find_coaches(&calendar.id).await.unwrap();
        assert_eq!(coaches, vec![ada]);
    }
}
