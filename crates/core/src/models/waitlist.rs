//! Waiting list model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a waiting list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    Pending,
    Contacted,
    Booked,
    Expired,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Pending => "pending",
            WaitlistStatus::Contacted => "contacted",
            WaitlistStatus::Booked => "booked",
            WaitlistStatus::Expired => "expired",
        }
    }
}

/// A contact wanting a slot that is currently full or closed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingListEntry {
    pub id: Uuid,
    pub show_slot_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guests: u32,
    pub status: WaitlistStatus,
    /// Free-form; references the originating reservation code when this
    /// entry came from a booking moved off the confirmed list
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WaitingListEntry {
    pub fn new(show_slot_id: Uuid, name: String, email: String, guests: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            show_slot_id,
            name,
            email,
            phone: None,
            guests,
            status: WaitlistStatus::Pending,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: String) -> Self {
        self.phone = Some(phone);
        self
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Whether this entry can still be converted into a booking
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            WaitlistStatus::Pending | WaitlistStatus::Contacted
        )
    }
}
