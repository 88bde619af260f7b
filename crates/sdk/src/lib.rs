mod appointment;
mod availability;
mod base;
mod coach;
mod status;
mod webhook;

use appointment::AppointmentClient;
use availability::AvailabilityClient;
use coach::CoachClient;
use status::StatusClient;
use std::sync::Arc;
use webhook::WebhookClient;

pub(crate) use base::BaseClient;
pub use base::{APIError, APIResponse};

pub use appointment::BookAppointmentInput;
pub use coach_assignment_api_structs::{dtos::*, ErrorResponse};
pub use coach_assignment_domain::ID;
pub use webhook::CalendarWebhookInput;

/// Coach Assignment Server SDK
///
/// The SDK contains methods for interacting with the coach assignment
/// server API.
#[derive(Clone)]
pub struct CoachAssignmentSDK {
    pub appointment: AppointmentClient,
    pub availability: AvailabilityClient,
    pub coach: CoachClient,
    pub status: StatusClient,
    pub webhook: WebhookClient,
}

impl CoachAssignmentSDK {
    pub fn new<T: Into<String>>(address: String, api_key: T) -> Self {
        let mut base = BaseClient::new(address);
        base.set_api_key(api_key.into());
        let base = Arc::new(base);

        Self {
            appointment: AppointmentClient::new(base.clone()),
            availability: AvailabilityClient::new(base.clone()),
            coach: CoachClient::new(base.clone()),
            status: StatusClient::new(base.clone()),
            webhook: WebhookClient::new(base),
        }
    }
}
