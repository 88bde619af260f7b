use crate::{Coach, ID};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Why a `Coach` won the assignment.
///
/// Names the first eligibility stage that left a single candidate, and
/// falls back to score comparison when several survived every stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SelectionReason {
    OnlyCoachOnCalendar,
    OnlyCoachWithinDailyLimit,
    OnlyCoachAvailable,
    HighestScore,
}

impl SelectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnlyCoachOnCalendar => "Only coach with this slot duration",
            Self::OnlyCoachWithinDailyLimit => "Only coach not reaching daily appointment limit",
            Self::OnlyCoachAvailable => "Only coach available at this time",
            Self::HighestScore => "Selected coach with highest score",
        }
    }
}

impl Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of candidates left after each eligibility stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilityFunnel {
    pub on_calendar: usize,
    pub within_daily_limit: usize,
    pub available: usize,
}

impl EligibilityFunnel {
    pub fn selection_reason(&self) -> SelectionReason {
        if self.on_calendar == 1 {
            SelectionReason::OnlyCoachOnCalendar
        } else if self.within_daily_limit == 1 {
            SelectionReason::OnlyCoachWithinDailyLimit
        } else if self.available == 1 {
            SelectionReason::OnlyCoachAvailable
        } else {
            SelectionReason::HighestScore
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoachSelection {
    pub coach: Coach,
    pub reason: SelectionReason,
    /// Ids of every eligible candidate, in pool order
    pub considered: Vec<ID>,
}

/// Picks the eligible `Coach` with the strictly greatest score.
///
/// Ties keep the candidate seen first, so pool order decides between equals.
pub struct HighestScoreAssignment {
    pub candidates: Vec<Coach>,
    pub funnel: EligibilityFunnel,
}

impl HighestScoreAssignment {
    pub fn assign(self) -> Option<CoachSelection> {
        let considered = self.candidates.iter().map(|c| c.id).collect::<Vec<_>>();
        let mut candidates = self.candidates.into_iter();
        let mut top = candidates.next()?;
        for candidate in candidates {
            if candidate.score > top.score {
                top = candidate;
            }
        }

        Some(CoachSelection {
            coach: top,
            reason: self.funnel.selection_reason(),
            considered,
        })
    }
}
