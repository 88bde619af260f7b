mod selection;

pub use selection::{CoachSelection, EligibilityFunnel, HighestScoreAssignment, SelectionReason};
