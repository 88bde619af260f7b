use crate::{
    error::AssignmentError,
    shared::{
        auth::protect_route,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Duration;
use coach_assignment_api_structs::{
    dtos::AvailableSlotDTO,
    get_availability::{APIResponse, QueryParams},
};
use coach_assignment_domain::{CalendarSlot, Coach};
use coach_assignment_infra::AssignmentContext;
use tracing::{debug, warn};

pub async fn get_availability_controller(
    http_req: HttpRequest,
    query: web::Query<QueryParams>,
    ctx: web::Data<AssignmentContext>,
) -> Result<HttpResponse, AssignmentError> {
    protect_route(&http_req, &ctx).await?;

    let usecase = SyncAvailabilityUseCase {
        days: query.days.unwrap_or(ctx.config.default_lookahead_days),
    };

    execute(usecase, &ctx).await.map(|slots| {
        let slots = slots.iter().map(AvailableSlotDTO::new).collect();
        HttpResponse::Ok().json(APIResponse::new(slots))
    })
}

/// Longest window the external calendar is asked to cover
pub const MAX_LOOKAHEAD_DAYS: i64 = 365;

/// Pulls every coach's availability from the external calendar into the
/// slot table and returns the open slots of the lookahead window.
#[derive(Debug)]
pub struct SyncAvailabilityUseCase {
    pub days: i64,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidLookahead(i64),
    StorageError(anyhow::Error),
}

impl From<UseCaseError> for AssignmentError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidLookahead(days) => Self::Validation(format!(
                "days must be between 1 and {}, got: {}",
                MAX_LOOKAHEAD_DAYS, days
            )),
            UseCaseError::StorageError(e) => Self::internal("Unable to sync availability", e),
        }
    }
}

impl SyncAvailabilityUseCase {
    /// Returns false when the calendar could not be reached for the coach
    async fn sync_coach(&self, ctx: &AssignmentContext, coach: &Coach) -> Result<bool, UseCaseError> {
        let windows = match ctx
            .services
            .calendar
            .get_availability(&coach.id, self.days)
            .await
        {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Skipping availability sync of coach {}: {}", coach.id, e);
                return Ok(false);
            }
        };

        let now = ctx.sys.now();
        let mut written = 0;
        for window in windows {
            for start in window.slot_starts() {
                let slot = CalendarSlot::new(coach.id, start, window.available, now);
                ctx.repos
                    .slots
                    .upsert(&slot)
                    .await
                    .map_err(UseCaseError::StorageError)?;
                written += 1;
            }
        }
        debug!("Synced {} slots of coach {}", written, coach.id);

        Ok(true)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SyncAvailabilityUseCase {
    type Response = Vec<CalendarSlot>;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncAvailability";

    async fn execute(&mut self, ctx: &AssignmentContext) -> Result<Self::Response, Self::Error> {
        if self.days <= 0 || self.days > MAX_LOOKAHEAD_DAYS {
            return Err(UseCaseError::InvalidLookahead(self.days));
        }

        let coaches = ctx
            .repos
            .coaches
            .find_all()
            .await
            .map_err(UseCaseError::StorageError)?;
        for coach in &coaches {
            self.sync_coach(ctx, coach).await?;
        }

        let now = ctx.sys.now();
        ctx.repos
            .slots
            .find_available(now, now + Duration::days(self.days))
            .await
            .map_err(UseCaseError::StorageError)
    }
}
