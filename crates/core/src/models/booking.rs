//! Booking model - a guest's reservation for a show slot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MerchandiseLine;

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingApproval,
    Confirmed,
    Rejected,
    Cancelled,
    MovedToWaitlist,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingApproval => "pending_approval",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::MovedToWaitlist => "moved_to_waitlist",
        }
    }

    /// Terminal statuses accept no further lifecycle transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::MovedToWaitlist
        )
    }
}

/// Who cancelled a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelActor {
    User,
    Admin,
}

impl CancelActor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelActor::User => "user",
            CancelActor::Admin => "admin",
        }
    }
}

/// One slot-to-slot move recorded on a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRecord {
    pub old_show_slot_id: Uuid,
    pub new_show_slot_id: Uuid,
    pub rescheduled_by: String,
    pub timestamp: DateTime<Utc>,
}

/// A reservation record for one party of guests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Human-facing, time-based reservation code
    pub reservation_code: String,
    pub show_slot_id: Uuid,
    pub package_id: Uuid,
    pub package_name: String,
    pub guests: u32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub billing_address: Option<String>,
    pub status: BookingStatus,
    /// Flagged when the capacity check at submit/reschedule time failed.
    /// Cleared on admin approval.
    pub is_overbooking: bool,
    /// True exactly while this booking's guests are counted in the owning
    /// slot's `booked_count`. All capacity release logic keys off this flag.
    pub holds_capacity: bool,
    pub total_price_cents: i64,
    pub applied_promo_code: Option<String>,
    pub discount_cents: i64,
    pub add_on_ids: Vec<Uuid>,
    pub merchandise: Vec<MerchandiseLine>,
    pub reschedule_history: Vec<RescheduleRecord>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelActor>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Append-only timestamped notes from back-office actions
    pub admin_notes: String,
    /// Supplied by the submitting client; resubmission with the same key
    /// returns the original booking instead of creating a duplicate.
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        show_slot_id: Uuid,
        package_id: Uuid,
        package_name: String,
        guests: u32,
        customer_name: String,
        customer_email: String,
    ) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Self {
            id,
            reservation_code: generate_reservation_code(now, id),
            show_slot_id,
            package_id,
            package_name,
            guests,
            customer_name,
            customer_email,
            customer_phone: None,
            billing_address: None,
            status: BookingStatus::Confirmed,
            is_overbooking: false,
            holds_capacity: false,
            total_price_cents: 0,
            applied_promo_code: None,
            discount_cents: 0,
            add_on_ids: Vec::new(),
            merchandise: Vec::new(),
            reschedule_history: Vec::new(),
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            admin_notes: String::new(),
            idempotency_key: None,
            created_at: now,
        }
    }

    /// Append a timestamped line to the admin notes
    pub fn append_note(&mut self, note: &str) {
        let stamp = Utc::now().format("%Y-%m-%d %H:%M");
        self.admin_notes.push_str(&format!("[{}] {}\n", stamp, note));
    }
}

/// Build a human-facing reservation code from the submission time,
/// e.g. `R-20260912-193004-4F2A`. The id-derived suffix disambiguates
/// same-second submissions.
pub fn generate_reservation_code(now: DateTime<Utc>, id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!(
        "R-{}-{}",
        now.format("%Y%m%d-%H%M%S"),
        hex[..4].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_code_shape() {
        let code = generate_reservation_code(Utc::now(), Uuid::new_v4());
        assert!(code.starts_with("R-"));
        // R- + 8 date + - + 6 time + - + 4 suffix
        assert_eq!(code.len(), 22);
    }

    #[test]
    fn test_same_second_codes_differ() {
        let now = Utc::now();
        let a = generate_reservation_code(now, Uuid::new_v4());
        let b = generate_reservation_code(now, Uuid::new_v4());
        assert_ne!(a, b);
    }

    #[test]
    fn test_append_note_accumulates() {
        let mut b = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Dinner & Show".into(),
            2,
            "Ada Guest".into(),
            "ada@example.com".into(),
        );
        b.append_note("approved overbooking");
        b.append_note("rescheduled to premiere night");
        assert_eq!(b.admin_notes.lines().count(), 2);
        assert!(b.admin_notes.contains("approved overbooking"));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(BookingStatus::MovedToWaitlist.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(!BookingStatus::PendingApproval.is_terminal());
    }
}
