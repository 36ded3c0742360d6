//! Merchandise models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An item sold alongside bookings (posters, CDs, gift boxes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchandiseItem {
    pub id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl MerchandiseItem {
    pub fn new(name: String, unit_price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            unit_price_cents,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A merchandise line on a booking. Name and unit price are denormalized
/// at submission time so later catalog edits don't reprice past bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchandiseLine {
    pub merchandise_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

impl MerchandiseLine {
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}
