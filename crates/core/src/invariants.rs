//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Booking, BookingStatus, Invoice, PromoCode, ShowSlot};

/// Validate that a booking's status flags are internally consistent
pub fn assert_booking_invariants(booking: &Booking) {
    // A confirmed booking is never still flagged as an overbooking
    debug_assert!(
        !(booking.status == BookingStatus::Confirmed && booking.is_overbooking),
        "Booking {} is confirmed but still flagged as overbooking",
        booking.id
    );

    // Only confirmed bookings hold capacity
    debug_assert!(
        !booking.holds_capacity || booking.status == BookingStatus::Confirmed,
        "Booking {} holds capacity with status {:?}",
        booking.id,
        booking.status
    );

    debug_assert!(
        booking.guests >= 1,
        "Booking {} has zero guests",
        booking.id
    );

    // Cancellation fields travel together
    debug_assert!(
        (booking.status == BookingStatus::Cancelled) == booking.cancelled_at.is_some(),
        "Booking {} has mismatched cancellation state",
        booking.id
    );
}

/// Validate that a slot's counter matches the bookings that claim to hold
/// capacity in it. `bookings` must be the complete set for this slot.
pub fn assert_slot_ledger(slot: &ShowSlot, bookings: &[Booking]) {
    let held: u32 = bookings
        .iter()
        .filter(|b| b.show_slot_id == slot.id && b.holds_capacity)
        .map(|b| b.guests)
        .sum();

    debug_assert!(
        slot.booked_count == held,
        "Slot {} counter {} disagrees with held capacity {}",
        slot.id,
        slot.booked_count,
        held
    );
}

/// Validate promo code bookkeeping
pub fn assert_promo_invariants(promo: &PromoCode) {
    if let Some(limit) = promo.usage_limit {
        debug_assert!(
            promo.times_used <= limit,
            "Promo {} used {} times past its limit of {}",
            promo.code,
            promo.times_used,
            limit
        );
    }

    debug_assert!(
        promo.value >= 0,
        "Promo {} has negative value",
        promo.code
    );
}

/// Validate invoice amount decomposition
pub fn assert_invoice_invariants(invoice: &Invoice) {
    debug_assert!(
        invoice.net_cents + invoice.vat_cents == invoice.gross_cents,
        "Invoice {} net {} + vat {} != gross {}",
        invoice.invoice_number,
        invoice.net_cents,
        invoice.vat_cents,
        invoice.gross_cents
    );

    let line_total: i64 = invoice.lines.iter().map(|l| l.amount_cents).sum();
    debug_assert!(
        line_total == invoice.gross_cents,
        "Invoice {} lines sum to {} but gross is {}",
        invoice.invoice_number,
        line_total,
        invoice.gross_cents
    );
}
