use chrono::{DateTime, Utc};
use coach_assignment_domain::{scheduling::EligibilityFunnel, Coach, ID};
use coach_assignment_infra::{BookingTxError, IBookingTransaction};
use tracing::{debug, warn};

/// Candidates left after every eligibility stage, together with the
/// survivor counts of each stage.
#[derive(Debug)]
pub struct EligibleCoaches {
    pub candidates: Vec<Coach>,
    pub funnel: EligibilityFunnel,
    /// Start plus the slot duration of the calendar
    pub end: DateTime<Utc>,
}

/// Runs the three filter stages for a booking at `start` on the calendar.
///
/// Every read goes through `tx`, so the result holds for as long as the
/// booking transaction is open. An unknown calendar yields no candidates.
pub async fn find_eligible_coaches(
    tx: &mut dyn IBookingTransaction,
    calendar_id: &ID,
    start: DateTime<Utc>,
) -> Result<EligibleCoaches, BookingTxError> {
    let calendar = match tx.find_calendar(calendar_id).await? {
        Some(calendar) => calendar,
        None => {
            warn!("Booking requested on unknown calendar: {}", calendar_id);
            return Ok(EligibleCoaches {
                candidates: Vec::new(),
                funnel: EligibilityFunnel::default(),
                end: start,
            });
        }
    };
    let end = calendar.appointment_end(start);

    let on_calendar = tx.find_coaches_on_calendar(calendar_id).await?;
    let mut funnel = EligibilityFunnel {
        on_calendar: on_calendar.len(),
        ..Default::default()
    };

    let day = start.date_naive();
    let mut within_daily_limit = Vec::with_capacity(on_calendar.len());
    for coach in on_calendar {
        let (from, to) = coach.working_hours.window_on(day);
        let booked = tx.count_scheduled_between(&coach.id, from, to).await?;
        if coach.has_capacity(booked) {
            within_daily_limit.push(coach);
        } else {
            debug!("Coach {} reached the daily limit on {}", coach.id, day);
        }
    }
    funnel.within_daily_limit = within_daily_limit.len();

    let mut available = Vec::with_capacity(within_daily_limit.len());
    for coach in within_daily_limit {
        if tx.is_slot_bookable(&coach.id, start, end).await? {
            available.push(coach);
        }
    }
    funnel.available = available.len();

    Ok(EligibleCoaches {
        candidates: available,
        funnel,
        end,
    })
}
