mod appointment;
mod calendar;
mod coach;
mod distribution;
mod idempotency;
pub mod scheduling;
mod shared;
mod slot;
mod webhook;

pub use appointment::{Appointment, AppointmentStatus, InvalidStatusError, NewAppointment};
pub use calendar::Calendar;
pub use coach::{Coach, WorkingHours};
pub use distribution::{compute_fairness_score, CoachUtilization, DistributionLogEntry};
pub use idempotency::{IdempotencyRecord, IDEMPOTENCY_TTL_HOURS};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use slot::{
    slot_granularity, split_into_slot_starts, truncate_to_minute, AvailabilityWindow,
    CalendarSlot, SLOT_GRANULARITY_MINUTES,
};
pub use webhook::{WebhookEvent, WebhookEventType};
