use super::{
    auth_api::{IAuthValidator, KeyPermissions, ValidateResponse},
    calendar_api::{BlockSlotRequest, CalendarWorkingHours, AvailabilityRules, CoachCalendarSettings, ICalendarClient},
    crm_api::{
        AppointmentCancelledRequest, AppointmentCreatedRequest, AppointmentCreatedResponse,
        AppointmentUpdatedRequest, CrmContact, GetContactError, ICrmClient,
    },
    delivery::{DeliveryError, DeliveryFailure},
};
use coach_assignment_domain::{AvailabilityWindow, ID};
use std::collections::HashMap;
use std::sync::Mutex;

fn unavailable(attempts: u32) -> DeliveryError {
    DeliveryError::Exhausted {
        attempts,
        last: DeliveryFailure::ServerError {
            status: 503,
            body: "Service temporarily unavailable".into(),
        },
    }
}

/// Calendar fake answering from configured windows and recording every
/// block and release it receives.
#[derive(Default)]
pub struct InMemoryCalendarApi {
    availability: Mutex<HashMap<ID, Vec<AvailabilityWindow>>>,
    failing_coaches: Mutex<Vec<ID>>,
    fail_block: Mutex<bool>,
    fail_release: Mutex<bool>,
    pub blocked: Mutex<Vec<(ID, BlockSlotRequest, String)>>,
    pub released: Mutex<Vec<(ID, String)>>,
}

impl InMemoryCalendarApi {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_availability(&self, coach_id: ID, windows: Vec<AvailabilityWindow>) {
        if let Ok(mut availability) = self.availability.lock() {
            availability.insert(coach_id, windows);
        }
    }

    /// Makes availability lookups of the coach fail
    pub fn fail_coach(&self, coach_id: ID) {
        if let Ok(mut failing) = self.failing_coaches.lock() {
            failing.push(coach_id);
        }
    }

    pub fn fail_block_slot(&self, fail: bool) {
        if let Ok(mut fail_block) = self.fail_block.lock() {
            *fail_block = fail;
        }
    }

    pub fn fail_release_slot(&self, fail: bool) {
        if let Ok(mut fail_release) = self.fail_release.lock() {
            *fail_release = fail;
        }
    }
}

#[async_trait::async_trait]
impl ICalendarClient for InMemoryCalendarApi {
    async fn get_availability(
        &self,
        coach_id: &ID,
        _days: i64,
    ) -> Result<Vec<AvailabilityWindow>, DeliveryError> {
        let failing = self
            .failing_coaches
            .lock()
            .map(|f| f.contains(coach_id))
            .unwrap_or(false);
        if failing {
            return Err(unavailable(3));
        }
        Ok(self
            .availability
            .lock()
            .ok()
            .and_then(|a| a.get(coach_id).cloned())
            .unwrap_or_default())
    }

    async fn block_slot(
        &self,
        coach_id: &ID,
        req: &BlockSlotRequest,
        idempotency_key: &str,
    ) -> Result<String, DeliveryError> {
        if self.fail_block.lock().map(|f| *f).unwrap_or(false) {
            return Err(unavailable(3));
        }
        let mut blocked = self
            .blocked
            .lock()
            .map_err(|e| DeliveryError::Request(e.to_string()))?;
        blocked.push((*coach_id, req.clone(), idempotency_key.to_string()));
        Ok(format!("block_{}", blocked.len()))
    }

    async fn release_slot(&self, coach_id: &ID, block_id: &str) -> Result<(), DeliveryError> {
        if self.fail_release.lock().map(|f| *f).unwrap_or(false) {
            return Err(unavailable(1));
        }
        if let Ok(mut released) = self.released.lock() {
            released.push((*coach_id, block_id.to_string()));
        }
        Ok(())
    }

    async fn get_settings(&self, coach_id: &ID) -> Result<CoachCalendarSettings, DeliveryError> {
        Ok(CoachCalendarSettings {
            coach_id: coach_id.to_string(),
            working_hours: CalendarWorkingHours {
                start: "09:00".into(),
                end: "17:00".into(),
                timezone: "UTC".into(),
            },
            availability_rules: AvailabilityRules {
                min_notice_hours: 0,
                max_advance_days: 30,
                buffer_minutes: 0,
            },
            blocked_dates: Vec::new(),
        })
    }
}

/// CRM fake that records notifications with their idempotency keys
#[derive(Default)]
pub struct InMemoryCrmApi {
    fail_created: Mutex<bool>,
    pub created: Mutex<Vec<(AppointmentCreatedRequest, String)>>,
    pub updated: Mutex<Vec<(AppointmentUpdatedRequest, String)>>,
    pub cancelled: Mutex<Vec<(AppointmentCancelledRequest, String)>>,
}

impl InMemoryCrmApi {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn fail_notify_created(&self, fail: bool) {
        if let Ok(mut fail_created) = self.fail_created.lock() {
            *fail_created = fail;
        }
    }
}

#[async_trait::async_trait]
impl ICrmClient for InMemoryCrmApi {
    async fn notify_created(
        &self,
        req: &AppointmentCreatedRequest,
        idempotency_key: &str,
    ) -> Result<AppointmentCreatedResponse, DeliveryError> {
        if self.fail_created.lock().map(|f| *f).unwrap_or(false) {
            return Err(unavailable(3));
        }
        if let Ok(mut created) = self.created.lock() {
            created.push((req.clone(), idempotency_key.to_string()));
        }
        Ok(AppointmentCreatedResponse {
            success: true,
            crm_id: format!("crm_{}", req.appointment_id),
            message: None,
        })
    }

    async fn notify_updated(
        &self,
        req: &AppointmentUpdatedRequest,
        idempotency_key: &str,
    ) -> Result<(), DeliveryError> {
        if let Ok(mut updated) = self.updated.lock() {
            updated.push((req.clone(), idempotency_key.to_string()));
        }
        Ok(())
    }

    async fn notify_cancelled(
        &self,
        req: &AppointmentCancelledRequest,
        idempotency_key: &str,
    ) -> Result<(), DeliveryError> {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push((req.clone(), idempotency_key.to_string()));
        }
        Ok(())
    }

    async fn get_contact(&self, contact_id: &str) -> Result<CrmContact, GetContactError> {
        Ok(CrmContact {
            id: contact_id.to_string(),
            email: format!("contact{}@example.com", contact_id),
            name: format!("Contact {}", contact_id),
            phone: None,
            tags: Vec::new(),
        })
    }
}

/// Accepts exactly the configured keys
pub struct StaticAuthValidator {
    valid_keys: Vec<String>,
}

impl StaticAuthValidator {
    pub fn new(valid_keys: Vec<String>) -> Self {
        Self { valid_keys }
    }
}

#[async_trait::async_trait]
impl IAuthValidator for StaticAuthValidator {
    async fn validate(&self, api_key: &str) -> Result<ValidateResponse, DeliveryError> {
        if !self.valid_keys.iter().any(|k| k == api_key) {
            return Ok(ValidateResponse::invalid("Invalid API key"));
        }
        Ok(ValidateResponse {
            valid: true,
            error: None,
            key_type: Some("test".into()),
            rate_limit: None,
            permissions: Some(KeyPermissions {
                read: true,
                write: true,
                delete: false,
            }),
        })
    }
}
