use super::delivery::{DeliveryClient, DeliveryError};
use crate::config::DeliveryConfig;
use chrono::{DateTime, Utc};
use coach_assignment_domain::{AvailabilityWindow, ID};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarApiSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available: bool,
}

impl From<CalendarApiSlot> for AvailabilityWindow {
    fn from(slot: CalendarApiSlot) -> Self {
        Self {
            start: slot.start_time,
            end: slot.end_time,
            available: slot.available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAvailabilityResponse {
    #[serde(default)]
    pub coach_id: String,
    #[serde(default)]
    pub slots: Vec<CalendarApiSlot>,
    #[serde(default)]
    pub total_available: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSlotRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSlotResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub coach_id: String,
    pub block_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSlotRequest {
    pub block_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarWorkingHours {
    pub start: String,
    pub end: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRules {
    pub min_notice_hours: i64,
    pub max_advance_days: i64,
    pub buffer_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachCalendarSettings {
    pub coach_id: String,
    pub working_hours: CalendarWorkingHours,
    pub availability_rules: AvailabilityRules,
    #[serde(default)]
    pub blocked_dates: Vec<String>,
}

/// The external calendar that owns the coaches' free/busy data
#[async_trait::async_trait]
pub trait ICalendarClient: Send + Sync {
    async fn get_availability(
        &self,
        coach_id: &ID,
        days: i64,
    ) -> Result<Vec<AvailabilityWindow>, DeliveryError>;
    /// Returns the external block id
    async fn block_slot(
        &self,
        coach_id: &ID,
        req: &BlockSlotRequest,
        idempotency_key: &str,
    ) -> Result<String, DeliveryError>;
    async fn release_slot(&self, coach_id: &ID, block_id: &str) -> Result<(), DeliveryError>;
    async fn get_settings(&self, coach_id: &ID) -> Result<CoachCalendarSettings, DeliveryError>;
}

pub struct CalendarRestApi {
    base_url: String,
    delivery: DeliveryClient,
}

impl CalendarRestApi {
    pub fn new(base_url: String, delivery: DeliveryClient) -> Self {
        Self { base_url, delivery }
    }

    fn coach_url(&self, coach_id: &ID, path: &str) -> String {
        format!("{}/coaches/{}/{}", self.base_url, coach_id, path)
    }
}

#[async_trait::async_trait]
impl ICalendarClient for CalendarRestApi {
    async fn get_availability(
        &self,
        coach_id: &ID,
        days: i64,
    ) -> Result<Vec<AvailabilityWindow>, DeliveryError> {
        let url = format!("{}?days={}", self.coach_url(coach_id, "availability"), days);
        let res: GetAvailabilityResponse = self
            .delivery
            .get(&url, self.delivery.policy())
            .await
            .map_err(|e| {
                error!(
                    "Failed to get availability of coach: {} from calendar. Error message: {:?}",
                    coach_id, e
                );
                e
            })?;
        Ok(res.slots.into_iter().map(|slot| slot.into()).collect())
    }

    async fn block_slot(
        &self,
        coach_id: &ID,
        req: &BlockSlotRequest,
        idempotency_key: &str,
    ) -> Result<String, DeliveryError> {
        let res: BlockSlotResponse = self
            .delivery
            .post(
                &self.coach_url(coach_id, "block-slot"),
                req,
                Some(idempotency_key),
                self.delivery.policy(),
            )
            .await
            .map_err(|e| {
                error!(
                    "Failed to block slot of coach: {} with request: {:?}. Error message: {:?}",
                    coach_id, req, e
                );
                e
            })?;
        Ok(res.block_id)
    }

    async fn release_slot(&self, coach_id: &ID, block_id: &str) -> Result<(), DeliveryError> {
        let req = ReleaseSlotRequest {
            block_id: block_id.to_string(),
        };
        let _: serde::de::IgnoredAny = self
            .delivery
            .post(
                &self.coach_url(coach_id, "release-slot"),
                &req,
                None,
                &DeliveryConfig::single_attempt(),
            )
            .await
            .map_err(|e| {
                error!(
                    "Failed to release block: {} of coach: {}. Error message: {:?}",
                    block_id, coach_id, e
                );
                e
            })?;
        Ok(())
    }

    async fn get_settings(&self, coach_id: &ID) -> Result<CoachCalendarSettings, DeliveryError> {
        self.delivery
            .get(
                &self.coach_url(coach_id, "settings"),
                &DeliveryConfig::single_attempt(),
            )
            .await
            .map_err(|e| {
                error!(
                    "Failed to get calendar settings of coach: {}. Error message: {:?}",
                    coach_id, e
                );
                e
            })
    }
}
