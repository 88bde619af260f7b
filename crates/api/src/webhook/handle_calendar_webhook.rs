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
use coach_assignment_api_structs::handle_calendar_webhook::{APIResponse, RequestBody};
use coach_assignment_domain::{
    Appointment, AppointmentStatus, IdempotencyRecord, WebhookEvent, WebhookEventType, ID,
};
use coach_assignment_infra::{
    crm_api::{AppointmentCancelledRequest, AppointmentUpdatedRequest},
    delivery::{DeliveryError, IDEMPOTENCY_KEY_HEADER},
    AssignmentContext,
};
use tracing::{info, warn};

pub async fn handle_calendar_webhook_controller(
    http_req: HttpRequest,
    payload: web::Json<serde_json::Value>,
    ctx: web::Data<AssignmentContext>,
) -> Result<HttpResponse, AssignmentError> {
    protect_route(&http_req, &ctx).await?;
    let idempotency_key = Guard::required_header(&http_req, IDEMPOTENCY_KEY_HEADER)?;

    let payload = payload.0;
    let body: RequestBody = serde_json::from_value(payload.clone())
        .map_err(|e| AssignmentError::Validation(format!("Invalid webhook payload: {}", e)))?;

    let usecase = HandleCalendarWebhookUseCase {
        idempotency_key,
        event_type: body.event_type,
        appointment_id: Guard::against_malformed_id(&body.appointment_id, "appointmentId")?,
        payload,
    };

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(res))
}

/// Applies a state change pushed by the external calendar. Deliveries are
/// deduplicated by their idempotency key for a day.
#[derive(Debug)]
pub struct HandleCalendarWebhookUseCase {
    pub idempotency_key: String,
    pub event_type: String,
    pub appointment_id: ID,
    /// Body as received, stored with the event
    pub payload: serde_json::Value,
}

#[derive(Debug)]
pub enum UseCaseError {
    AppointmentNotFound(ID),
    StorageError(anyhow::Error),
    ReleaseSlot(ID, DeliveryError),
}

impl From<UseCaseError> for AssignmentError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::AppointmentNotFound(id) => {
                Self::Validation(format!("The appointment with id: {}, was not found", id))
            }
            UseCaseError::StorageError(e) => Self::internal("Unable to process webhook", e),
            UseCaseError::ReleaseSlot(id, e) => Self::gateway(
                &format!("Unable to release the calendar block of appointment {}", id),
                e,
            ),
        }
    }
}

impl HandleCalendarWebhookUseCase {
    fn cache_key(&self) -> String {
        format!("webhook:{}", self.idempotency_key)
    }

    async fn replay(&self, ctx: &AssignmentContext) -> Option<APIResponse> {
        let key = self.cache_key();
        let record = match ctx.repos.idempotency.get(&key, ctx.sys.now()).await {
            Ok(record) => record?,
            Err(e) => {
                warn!("Unable to read idempotency record {}: {:?}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&record.response) {
            Ok(res) => Some(res),
            Err(e) => {
                warn!("Ignoring corrupt idempotency record {}: {:?}", key, e);
                None
            }
        }
    }

    async fn cancel(
        &self,
        ctx: &AssignmentContext,
        appointment: &mut Appointment,
        now: DateTime<Utc>,
    ) -> Result<(), UseCaseError> {
        appointment.cancel(now);
        ctx.repos
            .appointments
            .save(appointment)
            .await
            .map_err(UseCaseError::StorageError)?;
        let released = ctx
            .repos
            .slots
            .release(&appointment.coach_id, appointment.start, appointment.end, now)
            .await
            .map_err(UseCaseError::StorageError)?;
        info!(
            "Cancelled appointment {} and released {} slots",
            appointment.id, released
        );

        if appointment.external_calendar_id.is_none() {
            warn!(
                "Appointment {} has no calendar block to release",
                appointment.id
            );
        }
        self.release_block(ctx, appointment, now).await?;
        self.notify_cancelled(ctx, appointment, now).await;

        Ok(())
    }

    /// Best effort, the CRM drops repeats by the idempotency key
    async fn notify_cancelled(
        &self,
        ctx: &AssignmentContext,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) {
        let req = AppointmentCancelledRequest {
            appointment_id: appointment.id.to_string(),
            coach_id: appointment.coach_id.to_string(),
            cancelled_at: appointment.cancelled_at.unwrap_or(now),
        };
        let key = format!("appointment-{}-cancelled", appointment.id);
        if let Err(e) = ctx.services.crm.notify_cancelled(&req, &key).await {
            warn!("CRM was not notified of cancellation {}: {}", appointment.id, e);
        }
    }

    /// Releases the calendar block held by the appointment, if any. The
    /// block id is cleared once released so a retry never releases it twice.
    async fn release_block(
        &self,
        ctx: &AssignmentContext,
        appointment: &mut Appointment,
        now: DateTime<Utc>,
    ) -> Result<(), UseCaseError> {
        let block_id = match &appointment.external_calendar_id {
            Some(block_id) => block_id.clone(),
            None => return Ok(()),
        };
        ctx.services
            .calendar
            .release_slot(&appointment.coach_id, &block_id)
            .await
            .map_err(|e| UseCaseError::ReleaseSlot(appointment.id, e))?;

        appointment.external_calendar_id = None;
        appointment.updated = now;
        ctx.repos
            .appointments
            .save(appointment)
            .await
            .map_err(UseCaseError::StorageError)
    }

    async fn confirm(
        &self,
        ctx: &AssignmentContext,
        appointment: &mut Appointment,
        now: DateTime<Utc>,
    ) -> Result<(), UseCaseError> {
        appointment.confirm(now);
        ctx.repos
            .appointments
            .save(appointment)
            .await
            .map_err(UseCaseError::StorageError)?;

        let req = AppointmentUpdatedRequest {
            appointment_id: appointment.id.to_string(),
            coach_id: appointment.coach_id.to_string(),
            status: AppointmentStatus::Confirmed.to_string(),
            updated_at: now,
        };
        let key = format!("appointment-{}-confirmed", appointment.id);
        if let Err(e) = ctx.services.crm.notify_updated(&req, &key).await {
            warn!("CRM was not notified of confirmation {}: {}", appointment.id, e);
        }

        Ok(())
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for HandleCalendarWebhookUseCase {
    type Response = APIResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "HandleCalendarWebhook";

    async fn execute(&mut self, ctx: &AssignmentContext) -> Result<Self::Response, Self::Error> {
        if let Some(res) = self.replay(ctx).await {
            info!("Webhook {} was already processed", self.idempotency_key);
            return Ok(res);
        }

        let now = ctx.sys.now();
        let event = WebhookEvent::received(ID::new(), &self.event_type, self.payload.clone(), now);
        if let Err(e) = ctx.repos.webhook_events.insert(&event).await {
            warn!("Unable to store webhook event {}: {:?}", event.id, e);
        }

        let mut appointment = ctx
            .repos
            .appointments
            .find(&self.appointment_id)
            .await
            .ok_or(UseCaseError::AppointmentNotFound(self.appointment_id))?;

        match WebhookEventType::parse(&self.event_type) {
            WebhookEventType::AppointmentCancelled if !appointment.is_scheduled() => {
                if appointment.external_calendar_id.is_some() {
                    info!(
                        "Retrying the calendar release of cancelled appointment {}",
                        appointment.id
                    );
                    self.release_block(ctx, &mut appointment, now).await?;
                    self.notify_cancelled(ctx, &appointment, now).await;
                } else {
                    info!(
                        "Acknowledging {} for appointment {} which is already {}",
                        self.event_type, appointment.id, appointment.status
                    );
                }
            }
            WebhookEventType::AppointmentConfirmed if !appointment.is_scheduled() => {
                info!(
                    "Acknowledging {} for appointment {} which is already {}",
                    self.event_type, appointment.id, appointment.status
                )
            }
            WebhookEventType::AppointmentCancelled => {
                self.cancel(ctx, &mut appointment, now).await?
            }
            WebhookEventType::AppointmentConfirmed => {
                self.confirm(ctx, &mut appointment, now).await?
            }
            WebhookEventType::Other(event_type) => {
                info!("Acknowledging unhandled webhook event type: {}", event_type)
            }
        }

        let res = APIResponse::new(event.id.to_string());
        match serde_json::to_string(&res) {
            Ok(response) => {
                let record = IdempotencyRecord::new(self.cache_key(), response, now);
                if let Err(e) = ctx.repos.idempotency.set(&record).await {
                    warn!("Unable to store idempotency record {}: {:?}", record.key, e);
                }
            }
            Err(e) => warn!("Unable to serialize webhook response: {:?}", e),
        }

        Ok(res)
    }
}
