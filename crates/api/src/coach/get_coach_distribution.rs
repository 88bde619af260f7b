use crate::{
    error::AssignmentError,
    shared::{
        auth::protect_route,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, NaiveTime};
use coach_assignment_api_structs::{dtos::CoachDistributionDTO, get_coach_distribution::APIResponse};
use coach_assignment_domain::{compute_fairness_score, CoachUtilization};
use coach_assignment_infra::AssignmentContext;

pub async fn get_coach_distribution_controller(
    http_req: HttpRequest,
    ctx: web::Data<AssignmentContext>,
) -> Result<HttpResponse, AssignmentError> {
    protect_route(&http_req, &ctx).await?;

    execute(GetCoachDistributionUseCase {}, &ctx)
        .await
        .map(|report| {
            HttpResponse::Ok().json(APIResponse {
                distribution: report
                    .utilizations
                    .into_iter()
                    .map(CoachDistributionDTO::new)
                    .collect(),
                fairness_score: report.fairness_score,
            })
        })
}

#[derive(Debug)]
pub struct GetCoachDistributionUseCase {}

#[derive(Debug)]
pub struct DistributionReport {
    pub utilizations: Vec<CoachUtilization>,
    pub fairness_score: f64,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError(anyhow::Error),
}

impl From<UseCaseError> for AssignmentError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError(e) => {
                Self::internal("Unable to compute the coach distribution", e)
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetCoachDistributionUseCase {
    type Response = DistributionReport;

    type Error = UseCaseError;

    const NAME: &'static str = "GetCoachDistribution";

    /// Today's scheduled load of every coach, today being the current UTC day
    async fn execute(&mut self, ctx: &AssignmentContext) -> Result<Self::Response, Self::Error> {
        let coaches = ctx
            .repos
            .coaches
            .find_all()
            .await
            .map_err(UseCaseError::StorageError)?;

        let today = ctx.sys.now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let tomorrow = today + Duration::days(1);

        let mut utilizations = Vec::with_capacity(coaches.len());
        for coach in coaches {
            let count = ctx
                .repos
                .appointments
                .count_scheduled_between(&coach.id, today, tomorrow)
                .await
                .map_err(UseCaseError::StorageError)?;
            utilizations.push(CoachUtilization::new(coach, count));
        }

        let ratios = utilizations.iter().map(|u| u.utilization).collect::<Vec<_>>();
        Ok(DistributionReport {
            fairness_score: compute_fairness_score(&ratios),
            utilizations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use coach_assignment_domain::{Appointment, Calendar, Coach, NewAppointment};
    use coach_assignment_infra::FixedSys;
    use std::sync::Arc;

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, h, 0, 0).unwrap()
    }

    async fn book(ctx: &AssignmentContext, coach: &Coach, start: DateTime<Utc>) {
        let calendar = Calendar::new("Intro call", 30);
        let appointment = Appointment::scheduled(
            NewAppointment {
                coach_id: coach.id,
                calendar_id: calendar.id,
                contact_id: "user-1".into(),
                notes: "",
                start,
                end: calendar.appointment_end(start),
            },
            start,
        );
        let mut tx = ctx.repos.bookings.begin().await.unwrap();
        tx.insert_appointment(&appointment).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[actix_web::test]
    async fn empty_pool_has_zero_fairness() {
        let ctx = AssignmentContext::create_inmemory();
        let report = GetCoachDistributionUseCase {}.execute(&ctx).await.unwrap();
        assert!(report.utilizations.is_empty());
        assert_eq!(report.fairness_score, 0.0);
    }

    #[actix_web::test]
    async fn counts_only_todays_appointments() {
        let mut ctx = AssignmentContext::create_inmemory();
        ctx.sys = Arc::new(FixedSys(at(6, 8)));
        let busy = Coach::new("busy", "busy@example.com", 1.0, 4);
        let idle = Coach::new("idle", "idle@example.com", 1.0, 4);
        let unlimited = Coach::new("unlimited", "unlimited@example.com", 1.0, 0);
        for coach in [&busy, &idle, &unlimited] {
            ctx.repos.coaches.insert(coach).await.unwrap();
        }
        book(&ctx, &busy, at(6, 10)).await;
        book(&ctx, &busy, at(6, 11)).await;
        book(&ctx, &idle, at(7, 10)).await;
        book(&ctx, &unlimited, at(6, 12)).await;

        let report = GetCoachDistributionUseCase {}.execute(&ctx).await.unwrap();
        let rows = report
            .utilizations
            .iter()
            .map(|u| (u.coach.name.as_str(), u.appointments_count, u.utilization))
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![("busy", 2, 0.5), ("idle", 0, 0.0), ("unlimited", 1, 0.0)]
        );
        let expected = compute_fairness_score(&[0.5, 0.0, 0.0]);
        assert!((report.fairness_score - expected).abs() < 1e-9);
    }
}
