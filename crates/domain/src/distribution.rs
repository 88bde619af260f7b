use crate::{shared::entity::ID, Coach};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only audit record of one coach selection decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionLogEntry {
    pub id: ID,
    pub appointment_id: ID,
    /// Coaches that survived every eligibility stage
    pub coaches_considered: Vec<ID>,
    pub selected_coach_id: ID,
    pub selection_reason: String,
    pub distribution_score: f64,
    pub created: DateTime<Utc>,
}

/// Today's load of a single `Coach`
#[derive(Debug, Clone, PartialEq)]
pub struct CoachUtilization {
    pub coach: Coach,
    pub appointments_count: i64,
    pub utilization: f64,
}

impl CoachUtilization {
    pub fn new(coach: Coach, appointments_count: i64) -> Self {
        let utilization = if coach.max_daily_appointments > 0 {
            appointments_count as f64 / coach.max_daily_appointments as f64
        } else {
            0.0
        };
        Self {
            coach,
            appointments_count,
            utilization,
        }
    }
}

/// `max(0, 1 - stdev)` over the population of utilization ratios.
///
/// 1 means the load is perfectly even across the pool. Empty input is 0.
pub fn compute_fairness_score(utilizations: &[f64]) -> f64 {
    if utilizations.is_empty() {
        return 0.0;
    }

    let n = utilizations.len() as f64;
    let mean = utilizations.iter().sum::<f64>() / n;
    let variance = utilizations
        .iter()
        .map(|u| {
            let diff = u - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    (1.0 - variance.sqrt()).max(0.0)
}
