//! Rescheduling a booking onto a different show slot

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::assert_booking_invariants;
use crate::models::{Booking, BookingStatus, RescheduleRecord};
use crate::permissions::DeskAction;
use crate::storage::{BookingStore, Database, ShowStore};

use super::capacity::{assess_capacity, CapacityDecision};
use super::{audit, Actor};

/// Edits applied to a booking; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct RescheduleRequest {
    pub new_show_slot_id: Option<Uuid>,
    pub guests: Option<u32>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub billing_address: Option<String>,
    /// Explicit admin consent to place the party past the target slot's
    /// capacity. Without it an overfull target routes the booking back
    /// into the approval queue.
    pub allow_overbooking: bool,
}

#[derive(Debug)]
pub struct RescheduleOutcome {
    pub booking: Booking,
    pub slot_changed: bool,
    /// The booking landed in the approval queue instead of the new slot
    pub needs_approval: bool,
}

/// Move and/or edit a booking. Old-slot release, target capacity check
/// and the history entry are one transaction: there is no window where
/// the booking points at the new slot while the counters disagree.
#[instrument(skip(db, req, actor), fields(booking = %booking_id))]
pub fn reschedule_booking(
    db: &mut Database,
    booking_id: Uuid,
    req: &RescheduleRequest,
    actor: &Actor,
) -> Result<RescheduleOutcome> {
    actor.require(DeskAction::RescheduleBooking)?;

    let tx = db.transaction()?;
    let mut booking = super::load_booking(&tx, booking_id)?;

    if booking.status.is_terminal() {
        return Err(Error::InvalidOperation(format!(
            "Booking {} is {} and cannot be rescheduled",
            booking.reservation_code,
            booking.status.as_str()
        )));
    }

    let old_slot_id = booking.show_slot_id;
    let old_guests = booking.guests;
    let target_slot_id = req.new_show_slot_id.unwrap_or(old_slot_id);
    let slot_changed = target_slot_id != old_slot_id;

    // Generic field edits
    if let Some(name) = &req.customer_name {
        booking.customer_name = name.clone();
    }
    if let Some(phone) = &req.customer_phone {
        booking.customer_phone = Some(phone.clone());
    }
    if let Some(address) = &req.billing_address {
        booking.billing_address = Some(address.clone());
    }
    let new_guests = req.guests.unwrap_or(old_guests).max(1);
    let guests_changed = new_guests != old_guests;

    let mut needs_approval = booking.status == BookingStatus::PendingApproval;

    if slot_changed || guests_changed {
        // Release whatever this booking currently holds, floored at zero
        if booking.holds_capacity {
            ShowStore::new(&tx).release_booked(old_slot_id, old_guests)?;
            booking.holds_capacity = false;
        }

        // Authoritative re-read of the target inside the transaction
        let target = super::load_slot(&tx, target_slot_id)?;

        match assess_capacity(target.booked_count, target.capacity, new_guests) {
            CapacityDecision::Overbooking if !req.allow_overbooking => {
                booking.status = BookingStatus::PendingApproval;
                booking.is_overbooking = true;
                needs_approval = true;
                booking.append_note(&format!(
                    "Reschedule to {} exceeds capacity, queued for approval",
                    target.date
                ));
            }
            _ => {
                // Fits, or the admin consented to overbook
                ShowStore::new(&tx).add_booked(target_slot_id, new_guests)?;
                booking.holds_capacity = true;
                needs_approval = false;
                if booking.status == BookingStatus::PendingApproval {
                    // A previously flagged overbooking that now fits
                    booking.append_note("Fits after reschedule, confirmed");
                }
                booking.status = BookingStatus::Confirmed;
                booking.is_overbooking = false;
            }
        }

        booking.show_slot_id = target_slot_id;
        booking.guests = new_guests;
    }

    if slot_changed {
        booking.reschedule_history.push(RescheduleRecord {
            old_show_slot_id: old_slot_id,
            new_show_slot_id: target_slot_id,
            rescheduled_by: "admin".to_string(),
            timestamp: Utc::now(),
        });
    }

    assert_booking_invariants(&booking);
    BookingStore::new(&tx).update(&booking)?;

    audit(
        &tx,
        actor,
        "booking.reschedule",
        booking.id,
        format!(
            "{}: {} -> {}",
            booking.reservation_code, old_slot_id, target_slot_id
        ),
    )?;
    tx.commit()?;

    info!(code = %booking.reservation_code, slot_changed, needs_approval, "Booking rescheduled");
    Ok(RescheduleOutcome {
        booking,
        slot_changed,
        needs_approval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desk::submit::{submit_reservation, SubmitOutcome, SubmitRequest};
    use crate::desk::testutil::{box_office, empty_slot, seeded_db};
    use crate::models::{PackageOption, ShowSlot};
    use crate::storage::Database;

    fn submit(db: &mut Database, slot: &ShowSlot, package: &PackageOption, guests: u32) -> Booking {
        let req = SubmitRequest {
            show_slot_id: slot.id,
            package_id: package.id,
            guests,
            customer_name: "Ada Guest".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: None,
            billing_address: None,
            add_on_ids: Vec::new(),
            merchandise: Vec::new(),
            promo_code: None,
            idempotency_key: None,
        };
        match submit_reservation(db, &req).unwrap() {
            SubmitOutcome::Created(b) => b,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    fn move_to(slot_id: Uuid) -> RescheduleRequest {
        RescheduleRequest {
            new_show_slot_id: Some(slot_id),
            ..RescheduleRequest::default()
        }
    }

    #[test]
    fn test_move_releases_old_slot_and_fills_new() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 2);
        let target = empty_slot(&db, 20);

        let outcome = reschedule_booking(&mut db, booking.id, &move_to(target.id), &box_office()).unwrap();
        assert!(outcome.slot_changed);
        assert!(!outcome.needs_approval);
        assert_eq!(outcome.booking.show_slot_id, target.id);
        assert_eq!(outcome.booking.reschedule_history.len(), 1);
        assert_eq!(outcome.booking.reschedule_history[0].old_show_slot_id, slot.id);

        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 8);
        assert_eq!(db.shows().find_by_id(target.id).unwrap().unwrap().booked_count, 2);
    }

    #[test]
    fn test_move_to_full_slot_queues_for_approval() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 2);
        let target = empty_slot(&db, 1);

        let outcome = reschedule_booking(&mut db, booking.id, &move_to(target.id), &box_office()).unwrap();
        assert!(outcome.needs_approval);
        assert_eq!(outcome.booking.status, BookingStatus::PendingApproval);
        assert!(outcome.booking.is_overbooking);
        assert!(!outcome.booking.holds_capacity);

        // Old slot released, new slot untouched
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 8);
        assert_eq!(db.shows().find_by_id(target.id).unwrap().unwrap().booked_count, 0);
    }

    #[test]
    fn test_admin_consent_overbooks_the_target() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 2);
        let target = empty_slot(&db, 1);

        let req = RescheduleRequest {
            new_show_slot_id: Some(target.id),
            allow_overbooking: true,
            ..RescheduleRequest::default()
        };
        let outcome = reschedule_booking(&mut db, booking.id, &req, &box_office()).unwrap();
        assert!(!outcome.needs_approval);
        assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
        assert_eq!(db.shows().find_by_id(target.id).unwrap().unwrap().booked_count, 2);
    }

    #[test]
    fn test_pending_overbooking_confirms_when_it_fits_elsewhere() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 3);
        assert_eq!(booking.status, BookingStatus::PendingApproval);
        let target = empty_slot(&db, 20);

        let outcome = reschedule_booking(&mut db, booking.id, &move_to(target.id), &box_office()).unwrap();
        assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
        assert!(!outcome.booking.is_overbooking);
        assert_eq!(db.shows().find_by_id(target.id).unwrap().unwrap().booked_count, 3);
    }

    #[test]
    fn test_guest_count_edit_in_same_slot_keeps_ledger_consistent() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 2);
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 10);

        let req = RescheduleRequest {
            guests: Some(1),
            ..RescheduleRequest::default()
        };
        let outcome = reschedule_booking(&mut db, booking.id, &req, &box_office()).unwrap();
        assert!(!outcome.slot_changed);
        assert!(outcome.booking.reschedule_history.is_empty());
        assert_eq!(outcome.booking.guests, 1);

        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 9);
    }

    #[test]
    fn test_contact_edit_alone_touches_no_counters() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 2);

        let req = RescheduleRequest {
            customer_name: Some("Ada B. Guest".into()),
            ..RescheduleRequest::default()
        };
        let outcome = reschedule_booking(&mut db, booking.id, &req, &box_office()).unwrap();
        assert_eq!(outcome.booking.customer_name, "Ada B. Guest");
        assert!(outcome.booking.holds_capacity);
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 10);
    }

    #[test]
    fn test_rescheduling_cancelled_booking_is_invalid() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 2);
        crate::desk::lifecycle::cancel_booking(
            &mut db,
            booking.id,
            "gone",
            crate::models::CancelActor::User,
            &box_office(),
        )
        .unwrap();

        let target = empty_slot(&db, 20);
        let err = reschedule_booking(&mut db, booking.id, &move_to(target.id), &box_office()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_unknown_target_slot_rolls_back_everything() {
        let (mut db, slot, package) = seeded_db();
        let booking = submit(&mut db, &slot, &package, 2);

        let err = reschedule_booking(&mut db, booking.id, &move_to(Uuid::new_v4()), &box_office())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // The release of the old slot must have rolled back with the failure
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 10);
        let stored = db.bookings().find_by_id(booking.id).unwrap().unwrap();
        assert!(stored.holds_capacity);
        assert_eq!(stored.show_slot_id, slot.id);
    }
}
