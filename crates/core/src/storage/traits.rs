//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future hosted backend).

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Booking, BookingStatus, Invoice, InvoiceStatus, PromoCode, ShowSlot, WaitingListEntry,
    WaitlistStatus,
};

/// Show slot repository operations
pub trait ShowRepository {
    /// Create a new show slot
    fn create_show(&self, slot: &ShowSlot) -> Result<()>;

    /// Find a slot by ID
    fn find_show_by_id(&self, id: Uuid) -> Result<Option<ShowSlot>>;

    /// Update slot fields except the booked counter
    fn update_show(&self, slot: &ShowSlot) -> Result<()>;

    /// Delete a slot
    fn delete_show(&self, slot_id: Uuid) -> Result<()>;

    /// List slots on or after a date
    fn list_shows_from(&self, from: NaiveDate) -> Result<Vec<ShowSlot>>;
}

/// Booking repository operations
pub trait BookingRepository {
    /// Insert a new booking
    fn create_booking(&self, booking: &Booking) -> Result<()>;

    /// Find a booking by ID
    fn find_booking_by_id(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Find a booking by its human-facing code
    fn find_booking_by_code(&self, reservation_code: &str) -> Result<Option<Booking>>;

    /// Write back a booking's mutable fields
    fn update_booking(&self, booking: &Booking) -> Result<()>;

    /// List bookings for a slot
    fn list_bookings_for_slot(&self, show_slot_id: Uuid) -> Result<Vec<Booking>>;

    /// List bookings in a status
    fn list_bookings_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>>;
}

/// Waiting list repository operations
pub trait WaitlistRepository {
    /// Create a waiting list entry
    fn create_waitlist_entry(&self, entry: &WaitingListEntry) -> Result<()>;

    /// Find an entry by ID
    fn find_waitlist_entry(&self, id: Uuid) -> Result<Option<WaitingListEntry>>;

    /// Update an entry's status
    fn set_waitlist_status(&self, id: Uuid, status: WaitlistStatus) -> Result<()>;

    /// Open entries for a slot in fairness order
    fn list_open_waitlist_for_slot(&self, show_slot_id: Uuid) -> Result<Vec<WaitingListEntry>>;
}

/// Promo code repository operations
pub trait PromoCodeRepository {
    /// Create a promo code
    fn create_promo_code(&self, promo: &PromoCode) -> Result<()>;

    /// Case-insensitive lookup by code string
    fn find_promo_by_code(&self, code: &str) -> Result<Option<PromoCode>>;

    /// Update a promo code's rules
    fn update_promo_code(&self, promo: &PromoCode) -> Result<()>;

    /// Record one redemption
    fn increment_promo_usage(&self, id: Uuid) -> Result<()>;
}

/// Invoice repository operations
pub trait InvoiceRepository {
    /// Insert an invoice or credit note
    fn create_invoice(&self, invoice: &Invoice) -> Result<()>;

    /// Find an invoice by ID
    fn find_invoice_by_id(&self, id: Uuid) -> Result<Option<Invoice>>;

    /// Invoices referencing a booking
    fn find_invoices_for_booking(&self, booking_id: Uuid) -> Result<Vec<Invoice>>;

    /// Transition an invoice's status
    fn set_invoice_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
        sent_at: Option<DateTime<Utc>>,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
}
