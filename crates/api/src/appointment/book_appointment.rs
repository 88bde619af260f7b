use super::eligibility::find_eligible_coaches;
use crate::{
    error::AssignmentError,
    shared::{
        auth::protect_route,
        guard::Guard,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use coach_assignment_api_structs::book_appointment::{APIResponse, RequestBody};
use coach_assignment_domain::{
    scheduling::HighestScoreAssignment, truncate_to_minute, Appointment, DistributionLogEntry,
    IdempotencyRecord, NewAppointment, ID,
};
use coach_assignment_infra::{
    calendar_api::BlockSlotRequest,
    crm_api::AppointmentCreatedRequest,
    delivery::{DeliveryError, IDEMPOTENCY_KEY_HEADER},
    AssignmentContext, BookingTxError,
};
use tracing::{info, warn};

pub async fn book_appointment_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<AssignmentContext>,
) -> Result<HttpResponse, AssignmentError> {
    protect_route(&http_req, &ctx).await?;

    let body = body.0;
    let usecase = BookAppointmentUseCase {
        calendar_id: Guard::against_malformed_id(&body.calendar_id, "calendarId")?,
        start: body.start_time,
        notes: body.notes,
        idempotency_key: Guard::optional_header(&http_req, IDEMPOTENCY_KEY_HEADER),
    };

    execute(usecase, &ctx)
        .await
        .map(|appointment| HttpResponse::Created().json(APIResponse::new(&appointment)))
}

#[derive(Debug)]
pub struct BookAppointmentUseCase {
    pub calendar_id: ID,
    pub start: DateTime<Utc>,
    pub notes: String,
    /// Client supplied key, used for replay and forwarded to the CRM
    pub idempotency_key: Option<String>,
}

#[derive(Debug)]
pub enum UseCaseError {
    NoEligibleCoach,
    SlotTaken,
    Transaction(anyhow::Error),
    CrmNotification(ID, DeliveryError),
    BlockSlot(ID, DeliveryError),
    StoreReference(ID, anyhow::Error),
}

impl From<BookingTxError> for UseCaseError {
    fn from(e: BookingTxError) -> Self {
        match e {
            BookingTxError::Conflict => Self::SlotTaken,
            BookingTxError::Storage(e) => Self::Transaction(e),
        }
    }
}

impl From<UseCaseError> for AssignmentError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NoEligibleCoach => {
                Self::NoSlot("No coach is available at the requested time".into())
            }
            UseCaseError::SlotTaken => {
                Self::NoSlot("The requested slot was booked by someone else".into())
            }
            UseCaseError::Transaction(e) => {
                Self::transaction("The booking transaction failed", e)
            }
            UseCaseError::CrmNotification(id, e) => Self::gateway(
                &format!("Appointment {} was booked but the CRM was not notified", id),
                e,
            ),
            UseCaseError::BlockSlot(id, e) => Self::gateway(
                &format!("Appointment {} was booked but the calendar slot was not blocked", id),
                e,
            ),
            UseCaseError::StoreReference(id, e) => Self::internal(
                &format!("Appointment {} was booked but its external reference was not stored", id),
                e,
            ),
        }
    }
}

impl BookAppointmentUseCase {
    fn cache_key(&self) -> Option<String> {
        self.idempotency_key
            .as_ref()
            .map(|key| format!("booking:{}", key))
    }

    /// Appointment of an earlier, fully successful booking with the same key
    async fn replay(&self, ctx: &AssignmentContext) -> Option<Appointment> {
        let key = self.cache_key()?;
        let record = match ctx.repos.idempotency.get(&key, ctx.sys.now()).await {
            Ok(record) => record?,
            Err(e) => {
                warn!("Unable to read idempotency record {}: {:?}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&record.response) {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                warn!("Ignoring corrupt idempotency record {}: {:?}", key, e);
                None
            }
        }
    }

    /// Selects a coach and books them in one serializable transaction
    async fn commit_booking(
        &self,
        ctx: &AssignmentContext,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, UseCaseError> {
        let mut tx = ctx.repos.bookings.begin().await?;

        let eligible = find_eligible_coaches(tx.as_mut(), &self.calendar_id, start).await?;
        let end = eligible.end;
        let selection = HighestScoreAssignment {
            candidates: eligible.candidates,
            funnel: eligible.funnel,
        }
        .assign()
        .ok_or(UseCaseError::NoEligibleCoach)?;

        let appointment = Appointment::scheduled(
            NewAppointment {
                coach_id: selection.coach.id,
                calendar_id: self.calendar_id,
                contact_id: format!("user-{}", uuid::Uuid::new_v4()),
                notes: &self.notes,
                start,
                end,
            },
            now,
        );
        tx.insert_appointment(&appointment).await?;
        tx.mark_slots_unavailable(&appointment.coach_id, start, end, now)
            .await?;
        tx.insert_distribution_log(&DistributionLogEntry {
            id: Default::default(),
            appointment_id: appointment.id,
            coaches_considered: selection.considered,
            selected_coach_id: selection.coach.id,
            selection_reason: selection.reason.to_string(),
            distribution_score: selection.coach.score,
            created: now,
        })
        .await?;
        tx.commit().await?;

        info!(
            "Booked appointment {} with coach {} ({})",
            appointment.id, appointment.coach_id, selection.reason
        );
        Ok(appointment)
    }

    /// Notifies the CRM and blocks the external calendar. The booking is
    /// already committed, so a failure here leaves it in place.
    async fn propagate(
        &self,
        ctx: &AssignmentContext,
        appointment: &mut Appointment,
    ) -> Result<(), UseCaseError> {
        let id = appointment.id;
        let crm_key = self
            .idempotency_key
            .clone()
            .unwrap_or_else(|| format!("appointment-{}-created", id));
        let crm_res = ctx
            .services
            .crm
            .notify_created(
                &AppointmentCreatedRequest {
                    appointment_id: id.to_string(),
                    coach_id: appointment.coach_id.to_string(),
                    start_time: appointment.start,
                    end_time: appointment.end,
                    client_id: appointment.contact_id.clone(),
                },
                &crm_key,
            )
            .await
            .map_err(|e| UseCaseError::CrmNotification(id, e))?;
        ctx.repos
            .appointments
            .set_crm_contact_id(&id, &crm_res.crm_id, ctx.sys.now())
            .await
            .map_err(|e| UseCaseError::StoreReference(id, e))?;
        appointment.crm_contact_id = Some(crm_res.crm_id);

        let block_id = ctx
            .services
            .calendar
            .block_slot(
                &appointment.coach_id,
                &BlockSlotRequest {
                    start_time: appointment.start,
                    end_time: appointment.end,
                },
                &format!("appointment-{}-block", id),
            )
            .await
            .map_err(|e| UseCaseError::BlockSlot(id, e))?;
        ctx.repos
            .appointments
            .set_external_calendar_id(&id, &block_id, ctx.sys.now())
            .await
            .map_err(|e| UseCaseError::StoreReference(id, e))?;
        appointment.external_calendar_id = Some(block_id);

        Ok(())
    }

    async fn store_response(&self, ctx: &AssignmentContext, appointment: &Appointment) {
        let key = match self.cache_key() {
            Some(key) => key,
            None => return,
        };
        let response = match serde_json::to_string(appointment) {
            Ok(response) => response,
            Err(e) => {
                warn!("Unable to serialize booking response: {:?}", e);
                return;
            }
        };
        let record = IdempotencyRecord::new(key, response, ctx.sys.now());
        if let Err(e) = ctx.repos.idempotency.set(&record).await {
            warn!("Unable to store idempotency record {}: {:?}", record.key, e);
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for BookAppointmentUseCase {
    type Response = Appointment;

    type Error = UseCaseError;

    const NAME: &'static str = "BookAppointment";

    async fn execute(&mut self, ctx: &AssignmentContext) -> Result<Self::Response, Self::Error> {
        if let Some(appointment) = self.replay(ctx).await {
            info!("Replaying booking of appointment {}", appointment.id);
            return Ok(appointment);
        }

        let start = truncate_to_minute(self.start);
        let mut appointment = self.commit_booking(ctx, start, ctx.sys.now()).await?;
        self.propagate(ctx, &mut appointment).await?;
        self.store_response(ctx, &appointment).await;

        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use coach_assignment_domain::{Calendar, CalendarSlot, Coach};
    use coach_assignment_infra::{
        inmemory::{InMemoryCalendarApi, InMemoryCrmApi},
        FixedSys,
    };
    use std::sync::Arc;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    struct TestContext {
        ctx: AssignmentContext,
        calendar_api: Arc<InMemoryCalendarApi>,
        crm: Arc<InMemoryCrmApi>,
        calendar: Calendar,
        coaches: Vec<Coach>,
    }

    async fn setup(scores: &[f64]) -> TestContext {
        let mut ctx = AssignmentContext::create_inmemory();
        ctx.sys = Arc::new(FixedSys(at(8, 0)));
        let calendar_api = Arc::new(InMemoryCalendarApi::new());
        let crm = Arc::new(InMemoryCrmApi::new());
        ctx.services.calendar = calendar_api.clone();
        ctx.services.crm = crm.clone();

        let calendar = Calendar::new("Intro call", 30);
        ctx.repos.calendars.insert(&calendar).await.unwrap();
        let mut coaches = Vec::new();
        for (i, score) in scores.iter().enumerate() {
            let coach = Coach::new(&format!("coach {}", i), "coach@example.com", *score, 5);
            ctx.repos.coaches.insert(&coach).await.unwrap();
            ctx.repos
                .calendars
                .add_coach(&calendar.id, &coach.id)
                .await
                .unwrap();
            for start in [at(10, 0), at(10, 15)] {
                ctx.repos
                    .slots
                    .upsert(&CalendarSlot::new(coach.id, start, true, at(7, 0)))
                    .await
                    .unwrap();
            }
            coaches.push(coach);
        }

        TestContext {
            ctx,
            calendar_api,
            crm,
            calendar,
            coaches,
        }
    }

    fn usecase(calendar_id: ID, idempotency_key: Option<&str>) -> BookAppointmentUseCase {
        BookAppointmentUseCase {
            calendar_id,
            start: at(10, 0),
            notes: "Intro".into(),
            idempotency_key: idempotency_key.map(String::from),
        }
    }

    #[actix_web::test]
    async fn books_the_highest_scored_coach() {
        let TestContext {
            ctx,
            calendar_api,
            crm,
            calendar,
            coaches,
        } = setup(&[3.0, 5.0, 5.0]).await;

        let mut usecase = usecase(calendar.id, None);
        let appointment = usecase.execute(&ctx).await.unwrap();

        assert_eq!(appointment.coach_id, coaches[1].id);
        assert_eq!(appointment.end, at(10, 0) + Duration::minutes(30));
        assert_eq!(appointment.title, "Intro");
        assert!(appointment.contact_id.starts_with("user-"));

        let log = ctx
            .repos
            .distribution_log
            .find_by_appointment(&appointment.id)
            .await
            .unwrap();
        assert_eq!(log.selection_reason, "Selected coach with highest score");
        assert_eq!(log.coaches_considered.len(), 3);
        assert_eq!(log.distribution_score, 5.0);

        for start in [at(10, 0), at(10, 15)] {
            let slot = ctx.repos.slots.find(&coaches[1].id, start).await.unwrap();
            assert!(!slot.available);
        }
        assert!(ctx.repos.slots.find(&coaches[0].id, at(10, 0)).await.unwrap().available);

        let created = crm.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].1, format!("appointment-{}-created", appointment.id));
        assert_eq!(calendar_api.blocked.lock().unwrap().len(), 1);

        let stored = ctx.repos.appointments.find(&appointment.id).await.unwrap();
        assert_eq!(stored.crm_contact_id, Some(format!("crm_{}", appointment.id)));
        assert_eq!(stored.external_calendar_id, Some("block_1".to_string()));
        assert_eq!(stored, appointment);
    }

    #[actix_web::test]
    async fn a_single_coach_is_selected_by_slot_duration() {
        let TestContext { ctx, calendar, .. } = setup(&[1.0]).await;
        let appointment = usecase(calendar.id, None).execute(&ctx).await.unwrap();
        let log = ctx
            .repos
            .distribution_log
            .find_by_appointment(&appointment.id)
            .await
            .unwrap();
        assert_eq!(log.selection_reason, "Only coach with this slot duration");
    }

    #[actix_web::test]
    async fn no_coaches_means_no_slot() {
        let TestContext { ctx, calendar, .. } = setup(&[]).await;
        let res = usecase(calendar.id, None).execute(&ctx).await;
        assert!(matches!(res, Err(UseCaseError::NoEligibleCoach)));

        let res = usecase(ID::new(), None).execute(&ctx).await;
        assert!(matches!(res, Err(UseCaseError::NoEligibleCoach)));
    }

    #[actix_web::test]
    async fn a_booked_slot_cannot_be_booked_again() {
        let TestContext { ctx, calendar, .. } = setup(&[1.0]).await;
        usecase(calendar.id, None).execute(&ctx).await.unwrap();

        let res = usecase(calendar.id, None).execute(&ctx).await;
        assert!(matches!(res, Err(UseCaseError::NoEligibleCoach)));
    }

    #[actix_web::test]
    async fn concurrent_bookings_of_one_slot_commit_once() {
        let TestContext {
            ctx,
            crm,
            calendar,
            coaches,
            ..
        } = setup(&[1.0]).await;

        let handles = ["first", "second"].map(|key| {
            let ctx = ctx.clone();
            let mut usecase = usecase(calendar.id, Some(key));
            actix_web::rt::spawn(async move { usecase.execute(&ctx).await })
        });
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let booked = results.iter().filter(|res| res.is_ok()).count();
        assert_eq!(booked, 1);
        assert!(results.iter().any(|res| matches!(
            res,
            Err(UseCaseError::NoEligibleCoach) | Err(UseCaseError::SlotTaken)
        )));

        let count = ctx
            .repos
            .appointments
            .count_scheduled_between(&coaches[0].id, at(0, 0), at(23, 59))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(crm.created.lock().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn crm_failure_keeps_the_committed_booking() {
        let TestContext {
            ctx,
            calendar_api,
            crm,
            calendar,
            coaches,
        } = setup(&[1.0]).await;
        crm.fail_notify_created(true);

        let res = usecase(calendar.id, Some("key-1")).execute(&ctx).await;
        let id = match res {
            Err(UseCaseError::CrmNotification(id, _)) => id,
            other => panic!("Expected crm failure, got {:?}", other),
        };

        let stored = ctx.repos.appointments.find(&id).await.unwrap();
        assert!(stored.is_scheduled());
        assert_eq!(stored.coach_id, coaches[0].id);
        assert!(stored.crm_contact_id.is_none());
        assert!(calendar_api.blocked.lock().unwrap().is_empty());
        // Only fully successful bookings are replayed
        assert!(ctx
            .repos
            .idempotency
            .get("booking:key-1", ctx.sys.now())
            .await
            .unwrap()
            .is_none());
    }

    #[actix_web::test]
    async fn block_failure_maps_to_gateway_error() {
        let TestContext {
            ctx,
            calendar_api,
            calendar,
            ..
        } = setup(&[1.0]).await;
        calendar_api.fail_block_slot(true);

        let err: AssignmentError = usecase(calendar.id, None)
            .execute(&ctx)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "GATEWAY_ERROR");
    }

    #[actix_web::test]
    async fn a_repeated_key_replays_the_booking() {
        let TestContext {
            ctx, crm, calendar, ..
        } = setup(&[1.0, 2.0]).await;

        let first = usecase(calendar.id, Some("key-1")).execute(&ctx).await.unwrap();
        let second = usecase(calendar.id, Some("key-1")).execute(&ctx).await.unwrap();
        assert_eq!(first, second);

        let created = crm.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].1, "key-1");
    }
}
