//! Waiting list registration and conversion to bookings

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::assert_booking_invariants;
use crate::models::{Booking, BookingStatus, WaitingListEntry, WaitlistStatus};
use crate::permissions::DeskAction;
use crate::storage::{BookingStore, Database, PackageStore, ShowStore, WaitlistStore};

use super::capacity::{assess_capacity, CapacityDecision};
use super::{audit, Actor};

/// Walk-in registration for a full or closed slot
#[derive(Debug, Clone)]
pub struct WalkInRequest {
    pub show_slot_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guests: u32,
    pub notes: Option<String>,
}

/// What converting a waiting list entry produced
#[derive(Debug)]
pub enum WaitlistBookingOutcome {
    /// The slot is overfull or closed and the operator has not confirmed;
    /// nothing was written. The caller shows a blocking confirm dialog
    /// and retries with `operator_confirmed` set.
    NeedsConfirmation { reason: String },
    /// A booking was created and the entry consumed
    Booked(Booking),
}

/// Put a contact on the waiting list for a slot
#[instrument(skip(db, req), fields(slot = %req.show_slot_id))]
pub fn register_walk_in(db: &mut Database, req: &WalkInRequest) -> Result<WaitingListEntry> {
    if req.name.trim().is_empty() {
        return Err(Error::Validation("Name is required".to_string()));
    }
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation("A valid email is required".to_string()));
    }

    let tx = db.transaction()?;
    // Slot must exist; a dangling waitlist entry can never be converted
    super::load_slot(&tx, req.show_slot_id)?;

    let entry = WaitingListEntry::new(
        req.show_slot_id,
        req.name.trim().to_string(),
        email.to_lowercase(),
        req.guests.max(1),
    );
    let entry = match &req.phone {
        Some(phone) => entry.with_phone(phone.clone()),
        None => entry,
    };
    let entry = match &req.notes {
        Some(notes) => entry.with_notes(notes.clone()),
        None => entry,
    };
    WaitlistStore::new(&tx).create(&entry)?;

    audit(
        &tx,
        &Actor::Customer,
        "waitlist.register",
        entry.id,
        format!("{} guests for slot {}", entry.guests, entry.show_slot_id),
    )?;
    tx.commit()?;

    Ok(entry)
}

/// Convert a waiting list entry into a booking for the chosen package.
///
/// An overfull or manually closed slot requires explicit operator
/// confirmation; the resulting booking then follows the usual capacity
/// rule (pending approval when overfull, confirmed otherwise).
#[instrument(skip(db, actor), fields(entry = %entry_id))]
pub fn book_from_waitlist(
    db: &mut Database,
    entry_id: Uuid,
    package_id: Uuid,
    operator_confirmed: bool,
    actor: &Actor,
) -> Result<WaitlistBookingOutcome> {
    actor.require(DeskAction::BookFromWaitlist)?;

    let tx = db.transaction()?;

    let entry = WaitlistStore::new(&tx)
        .find_by_id(entry_id)?
        .ok_or_else(|| Error::NotFound(format!("Waiting list entry {}", entry_id)))?;
    if !entry.is_open() {
        return Err(Error::InvalidOperation(format!(
            "Waiting list entry is already {}",
            entry.status.as_str()
        )));
    }

    let slot = super::load_slot(&tx, entry.show_slot_id)?;
    let package = PackageStore::new(&tx)
        .find_by_id(package_id)?
        .ok_or_else(|| Error::NotFound(format!("Package {}", package_id)))?;

    let per_guest = package
        .price_per_guest(slot.price_tier.as_deref())
        .ok_or_else(|| {
            Error::NotFound(format!(
                "No price configured for package '{}' at tier '{}'",
                package.name,
                slot.price_tier.as_deref().unwrap_or("default")
            ))
        })?;

    let decision = assess_capacity(slot.booked_count, slot.capacity, entry.guests);
    let overbooking_attempt = decision == CapacityDecision::Overbooking;

    if (overbooking_attempt || slot.is_manually_closed) && !operator_confirmed {
        let reason = if slot.is_manually_closed {
            "The slot is manually closed".to_string()
        } else {
            format!(
                "Only {} of {} seats remain for a party of {}",
                slot.available(),
                slot.capacity,
                entry.guests
            )
        };
        return Ok(WaitlistBookingOutcome::NeedsConfirmation { reason });
    }

    let mut booking = Booking::new(
        slot.id,
        package.id,
        package.name.clone(),
        entry.guests,
        entry.name.clone(),
        entry.email.clone(),
    );
    booking.customer_phone = entry.phone.clone();
    booking.total_price_cents = per_guest * i64::from(entry.guests);
    booking.append_note("Booked from waiting list");

    if overbooking_attempt {
        booking.status = BookingStatus::PendingApproval;
        booking.is_overbooking = true;
        booking.holds_capacity = false;
    } else {
        booking.status = BookingStatus::Confirmed;
        booking.is_overbooking = false;
        booking.holds_capacity = true;
    }
    assert_booking_invariants(&booking);

    BookingStore::new(&tx).create(&booking)?;
    if booking.holds_capacity {
        ShowStore::new(&tx).add_booked(slot.id, entry.guests)?;
    }
    WaitlistStore::new(&tx).set_status(entry.id, WaitlistStatus::Booked)?;

    audit(
        &tx,
        actor,
        "waitlist.book",
        booking.id,
        format!(
            "Entry {} -> booking {} ({})",
            entry.id,
            booking.reservation_code,
            booking.status.as_str()
        ),
    )?;
    tx.commit()?;

    info!(code = %booking.reservation_code, "Waiting list entry booked");
    Ok(WaitlistBookingOutcome::Booked(booking))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desk::testutil::{box_office, seeded_db};

    fn walk_in(slot_id: Uuid, guests: u32) -> WalkInRequest {
        WalkInRequest {
            show_slot_id: slot_id,
            name: "Ben Waiting".into(),
            email: "ben@example.com".into(),
            phone: None,
            guests,
            notes: None,
        }
    }

    #[test]
    fn test_walk_in_registration() {
        let (mut db, slot, _package) = seeded_db();
        let entry = register_walk_in(&mut db, &walk_in(slot.id, 4)).unwrap();
        assert_eq!(entry.status, WaitlistStatus::Pending);
        assert_eq!(db.waitlist().list_open_for_slot(slot.id).unwrap().len(), 1);
    }

    #[test]
    fn test_walk_in_for_unknown_slot_fails() {
        let (mut db, _slot, _package) = seeded_db();
        let err = register_walk_in(&mut db, &walk_in(Uuid::new_v4(), 4)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_booking_an_entry_that_fits() {
        let (mut db, slot, package) = seeded_db();
        let entry = register_walk_in(&mut db, &walk_in(slot.id, 2)).unwrap();

        let outcome =
            book_from_waitlist(&mut db, entry.id, package.id, false, &box_office()).unwrap();
        let booking = match outcome {
            WaitlistBookingOutcome::Booked(b) => b,
            other => panic!("expected Booked, got {:?}", other),
        };
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total_price_cents, 2 * 8900);

        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 10);
        let entry = db.waitlist().find_by_id(entry.id).unwrap().unwrap();
        assert_eq!(entry.status, WaitlistStatus::Booked);
    }

    #[test]
    fn test_overfull_slot_asks_for_confirmation_first() {
        let (mut db, slot, package) = seeded_db();
        let entry = register_walk_in(&mut db, &walk_in(slot.id, 5)).unwrap();

        let outcome =
            book_from_waitlist(&mut db, entry.id, package.id, false, &box_office()).unwrap();
        assert!(matches!(outcome, WaitlistBookingOutcome::NeedsConfirmation { .. }));

        // Nothing written
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 8);
        let entry = db.waitlist().find_by_id(entry.id).unwrap().unwrap();
        assert!(entry.is_open());
    }

    #[test]
    fn test_confirmed_overfull_conversion_goes_to_approval_queue() {
        let (mut db, slot, package) = seeded_db();
        let entry = register_walk_in(&mut db, &walk_in(slot.id, 5)).unwrap();

        let outcome =
            book_from_waitlist(&mut db, entry.id, package.id, true, &box_office()).unwrap();
        let booking = match outcome {
            WaitlistBookingOutcome::Booked(b) => b,
            other => panic!("expected Booked, got {:?}", other),
        };
        assert_eq!(booking.status, BookingStatus::PendingApproval);
        assert!(booking.is_overbooking);

        // Pending overbooking never moves the counter
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 8);
    }

    #[test]
    fn test_closed_slot_with_room_books_after_confirmation() {
        let (mut db, slot, package) = seeded_db();
        db.shows().set_manually_closed(slot.id, true).unwrap();
        let entry = register_walk_in(&mut db, &walk_in(slot.id, 2)).unwrap();

        let declined =
            book_from_waitlist(&mut db, entry.id, package.id, false, &box_office()).unwrap();
        assert!(matches!(declined, WaitlistBookingOutcome::NeedsConfirmation { .. }));

        let outcome =
            book_from_waitlist(&mut db, entry.id, package.id, true, &box_office()).unwrap();
        let booking = match outcome {
            WaitlistBookingOutcome::Booked(b) => b,
            other => panic!("expected Booked, got {:?}", other),
        };
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 10);
    }

    #[test]
    fn test_consumed_entry_cannot_be_booked_twice() {
        let (mut db, slot, package) = seeded_db();
        let entry = register_walk_in(&mut db, &walk_in(slot.id, 2)).unwrap();
        book_from_waitlist(&mut db, entry.id, package.id, false, &box_office()).unwrap();

        let err =
            book_from_waitlist(&mut db, entry.id, package.id, false, &box_office()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }
}
