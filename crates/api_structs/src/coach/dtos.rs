use coach_assignment_domain::{CoachUtilization, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoachDistributionDTO {
    pub coach_id: ID,
    pub name: String,
    pub email: String,
    pub score: f64,
    pub appointments_count: i64,
    pub utilization: f64,
}

impl CoachDistributionDTO {
    pub fn new(row: CoachUtilization) -> Self {
        Self {
            coach_id: row.coach.id,
            name: row.coach.name,
            email: row.coach.email,
            score: row.coach.score,
            appointments_count: row.appointments_count,
            utilization: row.utilization,
        }
    }
}
