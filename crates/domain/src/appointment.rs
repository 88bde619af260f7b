use crate::shared::entity::{Entity, ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
    /// Informational, the appointment still occupies its slot
    Confirmed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
            Self::Confirmed => "confirmed",
        }
    }
}

impl Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Unknown appointment status: {0}")]
pub struct InvalidStatusError(String);

impl FromStr for AppointmentStatus {
    type Err = InvalidStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "cancelled" => Ok(Self::Cancelled),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(InvalidStatusError(other.to_string())),
        }
    }
}

/// A booked session between a contact and a `Coach`.
///
/// Created only by the booking transaction and transitioned only by
/// inbound calendar webhooks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: ID,
    pub coach_id: ID,
    pub calendar_id: ID,
    pub contact_id: String,
    pub title: String,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub source: String,
    pub crm_contact_id: Option<String>,
    /// Block id returned by the external calendar
    pub external_calendar_id: Option<String>,
    pub webhook_attempts: i64,
    pub webhook_last_attempt: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

pub struct NewAppointment<'a> {
    pub coach_id: ID,
    pub calendar_id: ID,
    pub contact_id: String,
    pub notes: &'a str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Appointment {
    pub fn scheduled(params: NewAppointment, now: DateTime<Utc>) -> Self {
        Self {
            id: Default::default(),
            coach_id: params.coach_id,
            calendar_id: params.calendar_id,
            contact_id: params.contact_id,
            title: params.notes.to_string(),
            notes: params.notes.to_string(),
            start: params.start,
            end: params.end,
            status: AppointmentStatus::Scheduled,
            source: "api".into(),
            crm_contact_id: None,
            external_calendar_id: None,
            webhook_attempts: 0,
            webhook_last_attempt: None,
            cancelled_at: None,
            confirmed_at: None,
            created: now,
            updated: now,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }

    /// Whether this appointment occupies the instant `ts`
    pub fn covers(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = AppointmentStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.record_webhook_attempt(now);
    }

    pub fn confirm(&mut self, now: DateTime<Utc>) {
        self.confirmed_at = Some(now);
        self.record_webhook_attempt(now);
    }

    fn record_webhook_attempt(&mut self, now: DateTime<Utc>) {
        self.webhook_attempts += 1;
        self.webhook_last_attempt = Some(now);
        self.updated = now;
    }
}

impl Entity<ID> for Appointment {
    fn id(&self) -> ID {
        self.id
    }
}
