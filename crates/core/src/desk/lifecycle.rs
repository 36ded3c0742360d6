//! Approval, rejection, cancellation and waitlist conversion

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::assert_booking_invariants;
use crate::models::{Booking, BookingStatus, CancelActor, WaitingListEntry};
use crate::permissions::DeskAction;
use crate::storage::{BookingStore, Database, ShowStore, WaitlistStore};

use super::{audit, Actor};

/// Approve a pending overbooking. Capacity is deliberately NOT re-checked:
/// approval is the admin override that pushes a slot past capacity, and
/// the guests are added to the counter unconditionally.
#[instrument(skip(db, actor))]
pub fn approve_overbooking(db: &mut Database, booking_id: Uuid, actor: &Actor) -> Result<Booking> {
    actor.require(DeskAction::ApproveOverbooking)?;

    let tx = db.transaction()?;
    let mut booking = super::load_booking(&tx, booking_id)?;

    if booking.status != BookingStatus::PendingApproval {
        return Err(Error::InvalidOperation(format!(
            "Booking {} is {}, not pending approval",
            booking.reservation_code,
            booking.status.as_str()
        )));
    }

    booking.status = BookingStatus::Confirmed;
    booking.is_overbooking = false;
    booking.holds_capacity = true;
    booking.append_note("Overbooking approved");
    assert_booking_invariants(&booking);

    BookingStore::new(&tx).update(&booking)?;
    ShowStore::new(&tx).add_booked(booking.show_slot_id, booking.guests)?;

    audit(
        &tx,
        actor,
        "booking.approve",
        booking.id,
        format!("{} (+{} guests)", booking.reservation_code, booking.guests),
    )?;
    tx.commit()?;

    info!(code = %booking.reservation_code, "Overbooking approved");
    Ok(booking)
}

/// Reject a pending booking. Counter-neutral by construction: a pending
/// booking never held capacity, which the invariant check pins down
/// instead of assuming.
#[instrument(skip(db, actor, note))]
pub fn reject_booking(
    db: &mut Database,
    booking_id: Uuid,
    actor: &Actor,
    note: Option<&str>,
) -> Result<Booking> {
    actor.require(DeskAction::RejectBooking)?;

    let tx = db.transaction()?;
    let mut booking = super::load_booking(&tx, booking_id)?;

    if booking.status != BookingStatus::PendingApproval {
        return Err(Error::InvalidOperation(format!(
            "Booking {} is {}, not pending approval",
            booking.reservation_code,
            booking.status.as_str()
        )));
    }
    debug_assert!(!booking.holds_capacity, "pending booking held capacity");

    booking.status = BookingStatus::Rejected;
    booking.is_overbooking = false;
    booking.append_note(note.unwrap_or("Rejected"));
    assert_booking_invariants(&booking);

    BookingStore::new(&tx).update(&booking)?;

    audit(
        &tx,
        actor,
        "booking.reject",
        booking.id,
        booking.reservation_code.clone(),
    )?;
    tx.commit()?;

    Ok(booking)
}

/// Cancel a booking with a reason. Releases the slot counter only when
/// the booking actually holds capacity, floored at zero. An approved
/// overbooking holds capacity after approval and therefore releases
/// correctly here.
#[instrument(skip(db, actor, reason))]
pub fn cancel_booking(
    db: &mut Database,
    booking_id: Uuid,
    reason: &str,
    cancelled_by: CancelActor,
    actor: &Actor,
) -> Result<Booking> {
    if matches!(cancelled_by, CancelActor::Admin) {
        actor.require(DeskAction::CancelAnyBooking)?;
    }

    let tx = db.transaction()?;
    let mut booking = super::load_booking(&tx, booking_id)?;

    if booking.status.is_terminal() {
        return Err(Error::InvalidOperation(format!(
            "Booking {} is already {}",
            booking.reservation_code,
            booking.status.as_str()
        )));
    }

    let releases = booking.holds_capacity;

    booking.status = BookingStatus::Cancelled;
    booking.cancellation_reason = Some(reason.to_string());
    booking.cancelled_by = Some(cancelled_by);
    booking.cancelled_at = Some(Utc::now());
    booking.holds_capacity = false;
    booking.is_overbooking = false;
    booking.append_note(&format!("Cancelled by {}: {}", cancelled_by.as_str(), reason));
    assert_booking_invariants(&booking);

    BookingStore::new(&tx).update(&booking)?;
    if releases {
        ShowStore::new(&tx).release_booked(booking.show_slot_id, booking.guests)?;
    }

    audit(
        &tx,
        actor,
        "booking.cancel",
        booking.id,
        format!(
            "{} by {} ({} guests {})",
            booking.reservation_code,
            cancelled_by.as_str(),
            booking.guests,
            if releases { "released" } else { "not held" }
        ),
    )?;
    tx.commit()?;

    info!(code = %booking.reservation_code, released = releases, "Booking cancelled");
    Ok(booking)
}

/// Convert a booking into a waiting list entry without losing the
/// association. If the booking holds capacity the slot is released in the
/// same transaction; the old assumption that conversion is always
/// counter-neutral is replaced by an explicit check.
#[instrument(skip(db, actor))]
pub fn move_to_waitlist(
    db: &mut Database,
    booking_id: Uuid,
    actor: &Actor,
) -> Result<(Booking, WaitingListEntry)> {
    actor.require(DeskAction::MoveBookingToWaitlist)?;

    let tx = db.transaction()?;
    let mut booking = super::load_booking(&tx, booking_id)?;

    if booking.status.is_terminal() {
        return Err(Error::InvalidOperation(format!(
            "Booking {} is already {}",
            booking.reservation_code,
            booking.status.as_str()
        )));
    }

    let prior_status = booking.status;
    let releases = booking.holds_capacity;

    let entry = WaitingListEntry::new(
        booking.show_slot_id,
        booking.customer_name.clone(),
        booking.customer_email.clone(),
        booking.guests,
    )
    .with_notes(format!(
        "From booking {} (was {})",
        booking.reservation_code,
        prior_status.as_str()
    ));
    let entry = match &booking.customer_phone {
        Some(phone) => entry.with_phone(phone.clone()),
        None => entry,
    };
    WaitlistStore::new(&tx).create(&entry)?;

    booking.status = BookingStatus::MovedToWaitlist;
    booking.holds_capacity = false;
    booking.is_overbooking = false;
    booking.append_note("Moved to waiting list");
    assert_booking_invariants(&booking);
    BookingStore::new(&tx).update(&booking)?;

    if releases {
        ShowStore::new(&tx).release_booked(booking.show_slot_id, booking.guests)?;
    }

    audit(
        &tx,
        actor,
        "booking.move_to_waitlist",
        booking.id,
        booking.reservation_code.clone(),
    )?;
    tx.commit()?;

    Ok((booking, entry))
}
