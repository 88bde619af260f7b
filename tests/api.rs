mod helpers;

use chrono::{Duration, NaiveTime, Utc};
use coach_assignment_domain::AvailabilityWindow;
use coach_assignment_sdk::{
    APIError, BookAppointmentInput, CalendarWebhookInput, CoachAssignmentSDK, ID,
};
use helpers::setup::spawn_app;
use reqwest::StatusCode;

/// Start of the current UTC day
fn today() -> chrono::DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn book_input(calendar_id: ID, start: chrono::DateTime<Utc>, key: Option<&str>) -> BookAppointmentInput {
    BookAppointmentInput {
        calendar_id,
        start_time: start,
        notes: "Intro".into(),
        idempotency_key: key.map(String::from),
    }
}

fn assert_rejected(res: Result<impl std::fmt::Debug, APIError>, status: StatusCode, code: &str) {
    match res {
        Err(APIError::Rejected { status: s, body }) => {
            assert_eq!(s, status);
            assert_eq!(body.error, code);
        }
        other => panic!("Expected {} rejection, got {:?}", code, other),
    }
}

#[actix_web::test]
async fn test_status_ok() {
    let (_, sdk) = spawn_app().await;
    assert!(sdk.status.check_health().await.is_ok());
}

#[actix_web::test]
async fn test_requests_need_a_valid_api_key() {
    let (app, _) = spawn_app().await;

    let sdk = CoachAssignmentSDK::new(app.address.clone(), "");
    assert_rejected(
        sdk.coach.distribution().await,
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
    );

    let sdk = CoachAssignmentSDK::new(app.address.clone(), "not-a-key");
    assert_rejected(
        sdk.coach.distribution().await,
        StatusCode::UNAUTHORIZED,
        "VALIDATION_ERROR",
    );
    // Health is public
    assert!(sdk.status.check_health().await.is_ok());
}

#[actix_web::test]
async fn test_responses_advertise_the_rate_limit() {
    let (app, _) = spawn_app().await;
    let res = reqwest::get(format!("{}/health", app.address)).await.unwrap();
    assert_eq!(
        res.headers()
            .get("x-ratelimit-limit")
            .and_then(|v| v.to_str().ok()),
        Some(app.config.rate_limit_per_minute.to_string().as_str())
    );
}

#[actix_web::test]
async fn test_availability_sync() {
    let (app, sdk) = spawn_app().await;
    let (_, coaches) = app.seed_calendar(30, &[1.0, 2.0]).await;
    let start = today() + Duration::days(1) + Duration::hours(10);
    app.calendar_api.set_availability(
        coaches[0].id,
        vec![AvailabilityWindow {
            start,
            end: start + Duration::minutes(30),
            available: true,
        }],
    );
    app.calendar_api.fail_coach(coaches[1].id);

    let res = sdk.availability.get(Some(3)).await.unwrap();
    assert_eq!(res.total_available, 2);
    assert_eq!(res.slots[0].coach_id, coaches[0].id);
    assert_eq!(res.slots[0].start_time, start);
    assert_eq!(res.slots[1].start_time, start + Duration::minutes(15));

    assert_rejected(
        sdk.availability.get(Some(0)).await,
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
    );
}

#[actix_web::test]
async fn test_booking_flow() {
    let (app, sdk) = spawn_app().await;
    let (calendar, coaches) = app.seed_calendar(30, &[3.0, 7.0, 5.0]).await;
    let start = today();
    for coach in &coaches {
        app.calendar_api.set_availability(
            coach.id,
            vec![AvailabilityWindow {
                start,
                end: start + Duration::hours(1),
                available: true,
            }],
        );
    }
    sdk.availability.get(None).await.unwrap();

    let appointment = sdk
        .appointment
        .book(book_input(calendar.id, start, None))
        .await
        .unwrap();
    assert_eq!(appointment.coach_id, coaches[1].id);
    assert_eq!(appointment.status, "scheduled");
    assert_eq!(appointment.end_time, start + Duration::minutes(30));
    assert_eq!(app.crm.created.lock().unwrap().len(), 1);
    assert_eq!(app.calendar_api.blocked.lock().unwrap().len(), 1);

    let report = sdk.coach.distribution().await.unwrap();
    assert_eq!(report.distribution.len(), 3);
    assert_eq!(report.distribution[1].appointments_count, 1);
    assert!(report.fairness_score < 1.0);

    // The best coach is taken, the next best gets the same slot
    let next = sdk
        .appointment
        .book(book_input(calendar.id, start, None))
        .await
        .unwrap();
    assert_eq!(next.coach_id, coaches[2].id);
}

#[actix_web::test]
async fn test_booking_without_coaches_has_no_slot() {
    let (app, sdk) = spawn_app().await;
    let (calendar, _) = app.seed_calendar(30, &[]).await;

    assert_rejected(
        sdk.appointment
            .book(book_input(calendar.id, today(), None))
            .await,
        StatusCode::CONFLICT,
        "NO_SLOT_ERROR",
    );
}

#[actix_web::test]
async fn test_booking_replay_and_double_booking() {
    let (app, sdk) = spawn_app().await;
    let (calendar, coaches) = app.seed_calendar(15, &[1.0]).await;
    let start = today() + Duration::hours(9);
    app.calendar_api.set_availability(
        coaches[0].id,
        vec![AvailabilityWindow {
            start,
            end: start + Duration::minutes(15),
            available: true,
        }],
    );
    sdk.availability.get(None).await.unwrap();

    let first = sdk
        .appointment
        .book(book_input(calendar.id, start, Some("booking-1")))
        .await
        .unwrap();
    let replayed = sdk
        .appointment
        .book(book_input(calendar.id, start, Some("booking-1")))
        .await
        .unwrap();
    assert_eq!(first, replayed);
    assert_eq!(app.crm.created.lock().unwrap().len(), 1);

    assert_rejected(
        sdk.appointment
            .book(book_input(calendar.id, start, Some("booking-2")))
            .await,
        StatusCode::CONFLICT,
        "NO_SLOT_ERROR",
    );
}

#[actix_web::test]
async fn test_malformed_booking_is_a_validation_error() {
    let (app, _) = spawn_app().await;
    let res = reqwest::Client::new()
        .post(format!("{}/appointments", app.address))
        .header("x-api-key", coach_assignment_infra::INMEMORY_API_KEY)
        .json(&serde_json::json!({ "calendarId": "abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: coach_assignment_sdk::ErrorResponse = res.json().await.unwrap();
    assert_eq!(body.error, "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_calendar_webhooks() {
    let (app, sdk) = spawn_app().await;
    let (calendar, coaches) = app.seed_calendar(30, &[1.0]).await;
    let start = today() + Duration::hours(12);
    app.calendar_api.set_availability(
        coaches[0].id,
        vec![AvailabilityWindow {
            start,
            end: start + Duration::minutes(30),
            available: true,
        }],
    );
    sdk.availability.get(None).await.unwrap();
    let appointment = sdk
        .appointment
        .book(book_input(calendar.id, start, None))
        .await
        .unwrap();

    let cancel = || CalendarWebhookInput {
        event_type: "appointment.cancelled".into(),
        appointment_id: appointment.appointment_id,
        idempotency_key: "webhook-1".into(),
    };
    let first = sdk.webhook.send_calendar_event(cancel()).await.unwrap();
    let second = sdk.webhook.send_calendar_event(cancel()).await.unwrap();
    assert!(first.received);
    assert_eq!(first, second);
    assert_eq!(app.calendar_api.released.lock().unwrap().len(), 1);
    assert_eq!(app.crm.cancelled.lock().unwrap().len(), 1);

    // The slot is bookable again
    let rebooked = sdk
        .appointment
        .book(book_input(calendar.id, start, None))
        .await
        .unwrap();
    assert_ne!(rebooked.appointment_id, appointment.appointment_id);

    assert_rejected(
        sdk.webhook
            .send_calendar_event(CalendarWebhookInput {
                event_type: "appointment.cancelled".into(),
                appointment_id: ID::new(),
                idempotency_key: "webhook-2".into(),
            })
            .await,
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
    );

    let res = reqwest::Client::new()
        .post(format!("{}/webhooks/calendar", app.address))
        .header("x-api-key", coach_assignment_infra::INMEMORY_API_KEY)
        .json(&serde_json::json!({
            "eventType": "appointment.confirmed",
            "appointmentId": rebooked.appointment_id.to_string(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
