//! Booking screens view model

use matinee_core::{
    desk, Actor, Booking, BookingStatus, CancelActor, MerchandiseSelection, RescheduleRequest,
    SubmitOutcome, SubmitRequest, WaitlistBookingOutcome,
};
use uuid::Uuid;

use crate::state::{AppState, ToastLevel};

use super::{fail, require_actor, FormOutcome, SubmitFormOutcome};

/// Payload of the public booking form
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub show_slot_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    pub guests: u32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub billing_address: Option<String>,
    pub add_on_ids: Vec<Uuid>,
    /// (merchandise id, quantity) picks
    pub merchandise: Vec<(Uuid, u32)>,
    pub promo_code: Option<String>,
    /// Generated once when the form opens; survives resubmits
    pub idempotency_key: Option<String>,
}

/// Submit the booking form. The form closes on success whether the
/// booking confirmed or went to the approval queue.
pub fn submit_booking(state: &AppState, form: &BookingForm) -> SubmitFormOutcome {
    let (Some(slot_id), Some(package_id)) = (form.show_slot_id, form.package_id) else {
        state.push_toast(ToastLevel::Error, "Pick a show and a package first");
        return SubmitFormOutcome {
            success: false,
            status: None,
            reservation_code: None,
            message: "Pick a show and a package first".into(),
        };
    };

    let request = SubmitRequest {
        show_slot_id: slot_id,
        package_id,
        guests: form.guests,
        customer_name: form.name.clone(),
        customer_email: form.email.clone(),
        customer_phone: form.phone.clone(),
        billing_address: form.billing_address.clone(),
        add_on_ids: form.add_on_ids.clone(),
        merchandise: form
            .merchandise
            .iter()
            .map(|(id, quantity)| MerchandiseSelection {
                merchandise_id: *id,
                quantity: *quantity,
            })
            .collect(),
        promo_code: form.promo_code.clone(),
        idempotency_key: form.idempotency_key.clone(),
    };

    let mut db = state.db.lock().unwrap();
    let outcome = desk::submit_reservation(&mut db, &request);
    drop(db);

    match outcome {
        Ok(SubmitOutcome::Created(booking)) | Ok(SubmitOutcome::AlreadySubmitted(booking)) => {
            state.refresh_slot(booking.show_slot_id);
            let message = match booking.status {
                BookingStatus::Confirmed => {
                    format!("Reservation {} confirmed", booking.reservation_code)
                }
                _ => format!(
                    "Reservation {} received, awaiting confirmation",
                    booking.reservation_code
                ),
            };
            state.push_toast(ToastLevel::Success, message.clone());
            SubmitFormOutcome {
                success: true,
                status: Some(booking.status),
                reservation_code: Some(booking.reservation_code),
                message,
            }
        }
        Ok(SubmitOutcome::SlotClosed) => {
            let message = "This show is closed for direct booking; we can add you to the waiting list";
            state.push_toast(ToastLevel::Info, message);
            SubmitFormOutcome {
                success: false,
                status: None,
                reservation_code: None,
                message: message.into(),
            }
        }
        Ok(SubmitOutcome::PromoRejected(rejection)) => {
            let message = rejection.to_string();
            state.push_toast(ToastLevel::Error, message.clone());
            SubmitFormOutcome {
                success: false,
                status: None,
                reservation_code: None,
                message,
            }
        }
        Err(e) => {
            let outcome = fail(state, &e);
            SubmitFormOutcome {
                success: false,
                status: None,
                reservation_code: None,
                message: outcome.message,
            }
        }
    }
}

/// Approve a pending overbooking
pub fn approve(state: &AppState, booking_id: Uuid) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = desk::approve_overbooking(&mut db, booking_id, &actor);
    drop(db);

    match result {
        Ok(booking) => {
            state.refresh_slot(booking.show_slot_id);
            state.push_toast(
                ToastLevel::Success,
                format!("Overbooking {} approved", booking.reservation_code),
            );
            FormOutcome::ok("Approved")
        }
        Err(e) => fail(state, &e),
    }
}

/// Reject a pending booking
pub fn reject(state: &AppState, booking_id: Uuid, note: Option<&str>) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = desk::reject_booking(&mut db, booking_id, &actor, note);
    drop(db);

    match result {
        Ok(booking) => {
            state.push_toast(
                ToastLevel::Info,
                format!("Booking {} rejected", booking.reservation_code),
            );
            FormOutcome::ok("Rejected")
        }
        Err(e) => fail(state, &e),
    }
}

/// Cancel a booking on behalf of the guest or the house
pub fn cancel(state: &AppState, booking_id: Uuid, reason: &str, by_admin: bool) -> FormOutcome {
    let (cancelled_by, actor) = if by_admin {
        let Some(actor) = require_actor(state) else {
            return FormOutcome::failed("Staff sign-in required");
        };
        (CancelActor::Admin, actor)
    } else {
        (CancelActor::User, Actor::Customer)
    };

    let mut db = state.db.lock().unwrap();
    let result = desk::cancel_booking(&mut db, booking_id, reason, cancelled_by, &actor);
    drop(db);

    match result {
        Ok(booking) => {
            state.refresh_slot(booking.show_slot_id);
            state.push_toast(
                ToastLevel::Info,
                format!("Booking {} cancelled", booking.reservation_code),
            );
            FormOutcome::ok("Cancelled")
        }
        Err(e) => fail(state, &e),
    }
}

/// Move a booking onto the waiting list
pub fn convert_to_waitlist(state: &AppState, booking_id: Uuid) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = desk::move_to_waitlist(&mut db, booking_id, &actor);
    drop(db);

    match result {
        Ok((booking, _entry)) => {
            state.refresh_slot(booking.show_slot_id);
            state.push_toast(
                ToastLevel::Info,
                format!("Booking {} moved to the waiting list", booking.reservation_code),
            );
            FormOutcome::ok("Moved to waiting list")
        }
        Err(e) => fail(state, &e),
    }
}

/// Edits from the admin booking editor
#[derive(Debug, Clone, Default)]
pub struct RescheduleForm {
    pub new_show_slot_id: Option<Uuid>,
    pub guests: Option<u32>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub billing_address: Option<String>,
    pub allow_overbooking: bool,
}

/// Apply booking edits, moving slots when requested
pub fn reschedule(state: &AppState, booking_id: Uuid, form: &RescheduleForm) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let request = RescheduleRequest {
        new_show_slot_id: form.new_show_slot_id,
        guests: form.guests,
        customer_name: form.customer_name.clone(),
        customer_phone: form.customer_phone.clone(),
        billing_address: form.billing_address.clone(),
        allow_overbooking: form.allow_overbooking,
    };

    let mut db = state.db.lock().unwrap();
    let result = desk::reschedule_booking(&mut db, booking_id, &request, &actor);
    drop(db);

    match result {
        Ok(outcome) => {
            // Both slots changed counters; patch whichever we can see
            if let Some(record) = outcome.booking.reschedule_history.last() {
                state.refresh_slot(record.old_show_slot_id);
            }
            state.refresh_slot(outcome.booking.show_slot_id);

            if outcome.needs_approval {
                state.push_toast(
                    ToastLevel::Info,
                    "The new show is full; the booking went to the approval queue",
                );
            } else {
                state.push_toast(ToastLevel::Success, "Booking updated");
            }
            FormOutcome::ok("Updated")
        }
        Err(e) => fail(state, &e),
    }
}

/// Book a waiting list entry onto a package; set `operator_confirmed`
/// after the UI's blocking confirm dialog
pub fn book_waitlist_entry(
    state: &AppState,
    entry_id: Uuid,
    package_id: Uuid,
    operator_confirmed: bool,
) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = desk::book_from_waitlist(&mut db, entry_id, package_id, operator_confirmed, &actor);
    drop(db);

    match result {
        Ok(WaitlistBookingOutcome::Booked(booking)) => {
            state.refresh_slot(booking.show_slot_id);
            state.push_toast(
                ToastLevel::Success,
                format!("Booked from the waiting list as {}", booking.reservation_code),
            );
            FormOutcome::ok("Booked")
        }
        Ok(WaitlistBookingOutcome::NeedsConfirmation { reason }) => FormOutcome::failed(reason),
        Err(e) => fail(state, &e),
    }
}

/// Bookings waiting for an approval decision
pub fn pending_approvals(state: &AppState) -> Vec<Booking> {
    let db = state.db.lock().unwrap();
    db.bookings()
        .list_by_status(BookingStatus::PendingApproval)
        .unwrap_or_default()
}

/// All bookings attached to a slot
pub fn bookings_for_slot(state: &AppState, slot_id: Uuid) -> Vec<Booking> {
    let db = state.db.lock().unwrap();
    db.bookings().list_for_slot(slot_id).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use matinee_core::{PackageOption, ShowSlot, StaffMember, StaffRole};

    fn signed_in_state() -> (AppState, ShowSlot, PackageOption) {
        let state = AppState::in_memory().unwrap();

        let (slot, package) = {
            let db = state.db.lock().unwrap();
            let mut slot = ShowSlot::new(
                NaiveDate::from_ymd_opt(2099, 9, 12).unwrap(),
                NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
                10,
            );
            slot.booked_count = 8;
            db.shows().create(&slot).unwrap();

            let package = PackageOption::new("Dinner & Show".into()).with_flat_price(8900);
            db.packages().create(&package).unwrap();
            (slot, package)
        };

        let staff = StaffMember::new(
            "Jo Deskins".into(),
            "jo".into(),
            "unused-hash".into(),
            StaffRole::Manager,
        );
        state.set_current_staff(Some(staff));

        (state, slot, package)
    }

    fn form(slot: &ShowSlot, package: &PackageOption, guests: u32) -> BookingForm {
        BookingForm {
            show_slot_id: Some(slot.id),
            package_id: Some(package.id),
            guests,
            name: "Ada Guest".into(),
            email: "ada@example.com".into(),
            ..BookingForm::default()
        }
    }

    #[test]
    fn test_submit_closes_form_even_when_pending() {
        let (state, slot, package) = signed_in_state();
        let outcome = submit_booking(&state, &form(&slot, &package, 3));
        assert!(outcome.success);
        assert_eq!(outcome.status, Some(BookingStatus::PendingApproval));
        assert!(outcome.reservation_code.is_some());
    }

    #[test]
    fn test_submit_patches_cached_slot() {
        let (state, slot, package) = signed_in_state();
        state.reload_slots().unwrap();

        submit_booking(&state, &form(&slot, &package, 2));

        let cached = state.cached_slots();
        let patched = cached.iter().find(|s| s.id == slot.id).unwrap();
        assert_eq!(patched.booked_count, 10);
    }

    #[test]
    fn test_missing_selection_fails_with_toast() {
        let (state, _slot, package) = signed_in_state();
        let mut f = BookingForm {
            package_id: Some(package.id),
            guests: 2,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            ..BookingForm::default()
        };
        f.show_slot_id = None;

        let outcome = submit_booking(&state, &f);
        assert!(!outcome.success);
        assert!(!state.drain_toasts().is_empty());
    }

    #[test]
    fn test_approval_flow_through_the_viewmodel() {
        let (state, slot, package) = signed_in_state();
        let submitted = submit_booking(&state, &form(&slot, &package, 3));
        let code = submitted.reservation_code.unwrap();

        let booking_id = {
            let db = state.db.lock().unwrap();
            db.bookings().find_by_code(&code).unwrap().unwrap().id
        };

        let outcome = approve(&state, booking_id);
        assert!(outcome.success);

        let db = state.db.lock().unwrap();
        let slot = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(slot.booked_count, 11);
    }

    #[test]
    fn test_staff_actions_require_sign_in() {
        let (state, slot, package) = signed_in_state();
        let submitted = submit_booking(&state, &form(&slot, &package, 3));
        let code = submitted.reservation_code.unwrap();
        let booking_id = {
            let db = state.db.lock().unwrap();
            db.bookings().find_by_code(&code).unwrap().unwrap().id
        };

        state.set_current_staff(None);
        let outcome = approve(&state, booking_id);
        assert!(!outcome.success);
    }

    #[test]
    fn test_cancel_by_guest_needs_no_sign_in() {
        let (state, slot, package) = signed_in_state();
        let submitted = submit_booking(&state, &form(&slot, &package, 2));
        let code = submitted.reservation_code.unwrap();
        let booking_id = {
            let db = state.db.lock().unwrap();
            db.bookings().find_by_code(&code).unwrap().unwrap().id
        };

        state.set_current_staff(None);
        let outcome = cancel(&state, booking_id, "Guest called", false);
        assert!(outcome.success);

        let db = state.db.lock().unwrap();
        assert_eq!(db.shows().find_by_id(slot.id).unwrap().unwrap().booked_count, 8);
    }

    #[test]
    fn test_pending_approvals_listing() {
        let (state, slot, package) = signed_in_state();
        submit_booking(&state, &form(&slot, &package, 3));
        submit_booking(&state, &form(&slot, &package, 2));

        assert_eq!(pending_approvals(&state).len(), 1);
    }
}
