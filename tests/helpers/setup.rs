use coach_assignment_api::Application;
use coach_assignment_domain::{Calendar, Coach};
use coach_assignment_infra::{
    inmemory::{InMemoryCalendarApi, InMemoryCrmApi},
    AssignmentContext, Config, INMEMORY_API_KEY,
};
use coach_assignment_sdk::CoachAssignmentSDK;
use std::sync::Arc;

pub struct TestApp {
    pub config: Config,
    pub ctx: AssignmentContext,
    pub calendar_api: Arc<InMemoryCalendarApi>,
    pub crm: Arc<InMemoryCrmApi>,
    pub address: String,
}

impl TestApp {
    /// Registers coaches with the given scores on a new calendar
    pub async fn seed_calendar(&self, slot_duration: i64, scores: &[f64]) -> (Calendar, Vec<Coach>) {
        let calendar = Calendar::new("Intro call", slot_duration);
        self.ctx.repos.calendars.insert(&calendar).await.unwrap();
        let mut coaches = Vec::new();
        for (i, score) in scores.iter().enumerate() {
            let coach = Coach::new(
                &format!("coach {}", i),
                &format!("coach{}@example.com", i),
                *score,
                8,
            );
            self.ctx.repos.coaches.insert(&coach).await.unwrap();
            self.ctx
                .repos
                .calendars
                .add_coach(&calendar.id, &coach.id)
                .await
                .unwrap();
            coaches.push(coach);
        }
        (calendar, coaches)
    }
}

// Launch the application as a background task, backed by in-memory
// repositories and fakes of the external services
pub async fn spawn_app() -> (TestApp, CoachAssignmentSDK) {
    let mut ctx = AssignmentContext::create_inmemory();
    ctx.config.port = 0; // Random port
    let calendar_api = Arc::new(InMemoryCalendarApi::new());
    let crm = Arc::new(InMemoryCrmApi::new());
    ctx.services.calendar = calendar_api.clone();
    ctx.services.crm = crm.clone();

    let config = ctx.config.clone();
    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let sdk = CoachAssignmentSDK::new(address.clone(), INMEMORY_API_KEY);
    let app = TestApp {
        config,
        ctx,
        calendar_api,
        crm,
        address,
    };
    (app, sdk)
}
