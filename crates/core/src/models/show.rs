//! Show slot model - one bookable performance occurrence

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single date/time occurrence of a show with finite capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowSlot {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub capacity: u32,
    /// Denormalized sum of guests across bookings that currently hold capacity.
    /// Maintained by the reservation desk inside the same transaction as the
    /// booking write it reflects.
    pub booked_count: u32,
    pub is_manually_closed: bool,
    pub available_package_ids: Vec<Uuid>,
    /// Optional pricing tier key into a package's price levels
    pub price_tier: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShowSlot {
    pub fn new(date: NaiveDate, time: NaiveTime, capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            time,
            capacity,
            booked_count: 0,
            is_manually_closed: false,
            available_package_ids: Vec::new(),
            price_tier: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_packages(mut self, package_ids: Vec<Uuid>) -> Self {
        self.available_package_ids = package_ids;
        self
    }

    pub fn with_price_tier(mut self, tier: String) -> Self {
        self.price_tier = Some(tier);
        self
    }

    /// Remaining seats. Computed, never stored; an approved overbooking can
    /// push `booked_count` past `capacity`, in which case this is zero.
    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.booked_count)
    }

    /// Whether `guests` more seats fit without admin approval
    pub fn has_room_for(&self, guests: u32) -> bool {
        self.booked_count + guests <= self.capacity
    }

    pub fn offers_package(&self, package_id: Uuid) -> bool {
        self.available_package_ids.is_empty() || self.available_package_ids.contains(&package_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(capacity: u32, booked: u32) -> ShowSlot {
        let mut s = ShowSlot::new(
            NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            capacity,
        );
        s.booked_count = booked;
        s
    }

    #[test]
    fn test_available_is_computed() {
        assert_eq!(slot(10, 8).available(), 2);
        assert_eq!(slot(10, 10).available(), 0);
    }

    #[test]
    fn test_available_never_underflows_on_overbooked_slot() {
        assert_eq!(slot(10, 13).available(), 0);
    }

    #[test]
    fn test_has_room_for_boundary() {
        let s = slot(10, 8);
        assert!(s.has_room_for(2));
        assert!(!s.has_room_for(3));
    }

    #[test]
    fn test_empty_package_list_offers_everything() {
        let s = slot(10, 0);
        assert!(s.offers_package(Uuid::new_v4()));

        let pid = Uuid::new_v4();
        let s = s.with_packages(vec![pid]);
        assert!(s.offers_package(pid));
        assert!(!s.offers_package(Uuid::new_v4()));
    }
}
