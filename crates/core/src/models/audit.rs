//! Audit log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actor string used for customer-originated actions
pub const CUSTOMER_ACTOR: &str = "customer";

/// One back-office or booking-flow mutation, recorded in the same
/// transaction as the change it describes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// Staff id as string, or `customer`
    pub actor: String,
    /// Machine-readable action tag, e.g. `booking.approve`
    pub action: String,
    pub subject_id: Option<Uuid>,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(actor: String, action: &str, subject_id: Option<Uuid>, detail: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor,
            action: action.to_string(),
            subject_id,
            detail,
            created_at: Utc::now(),
        }
    }
}
