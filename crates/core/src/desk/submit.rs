//! Booking submission

use rusqlite::Transaction;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::assert_booking_invariants;
use crate::models::{
    Booking, BookingStatus, Customer, MerchandiseLine, NotificationKind, OutboxEntry, ShowSlot,
};
use crate::pricing;
use crate::promo::{self, PromoRejection};
use crate::storage::{
    BookingStore, CustomerStore, Database, MerchandiseStore, OutboxStore, PackageStore,
    PromoCodeStore, SettingsStore, ShowStore,
};

use super::capacity::{assess_capacity, CapacityDecision};
use super::{audit, Actor};

/// A merchandise pick on the booking form. Unit prices are resolved from
/// the catalog, never taken from the client.
#[derive(Debug, Clone)]
pub struct MerchandiseSelection {
    pub merchandise_id: Uuid,
    pub quantity: u32,
}

/// Everything the booking form submits
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub show_slot_id: Uuid,
    pub package_id: Uuid,
    /// Zero is treated as a single guest
    pub guests: u32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub billing_address: Option<String>,
    pub add_on_ids: Vec<Uuid>,
    pub merchandise: Vec<MerchandiseSelection>,
    pub promo_code: Option<String>,
    /// Generated once per form instance; a resubmission with the same key
    /// returns the original booking instead of creating a duplicate
    pub idempotency_key: Option<String>,
}

/// What a submission produced
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A new booking was written; `Confirmed` and `PendingApproval` are
    /// both terminal successes for the caller
    Created(Booking),
    /// The idempotency key matched an earlier submission; nothing written
    AlreadySubmitted(Booking),
    /// The slot is manually closed; nothing written. Callers offer the
    /// waiting list instead.
    SlotClosed,
    /// The promo code was refused; nothing written
    PromoRejected(PromoRejection),
}

/// Create a reservation against a show slot.
///
/// The capacity rule: a party that no longer fits is written as
/// `PendingApproval` with the overbooking flag set and does NOT touch the
/// slot counter; a party that fits is written as `Confirmed` and the
/// counter moves in the same transaction.
#[instrument(skip(db, req), fields(slot = %req.show_slot_id, guests = req.guests))]
pub fn submit_reservation(db: &mut Database, req: &SubmitRequest) -> Result<SubmitOutcome> {
    validate(req)?;

    let tx = db.transaction()?;

    // Replay detection before anything else
    if let Some(key) = &req.idempotency_key {
        if let Some(existing) = BookingStore::new(&tx).find_by_idempotency_key(key)? {
            info!(code = %existing.reservation_code, "Duplicate submission ignored");
            return Ok(SubmitOutcome::AlreadySubmitted(existing));
        }
    }

    let slot = super::load_slot(&tx, req.show_slot_id)?;
    let package = PackageStore::new(&tx)
        .find_by_id(req.package_id)?
        .filter(|p| p.is_active)
        .ok_or_else(|| Error::NotFound(format!("Package {}", req.package_id)))?;

    if !slot.offers_package(package.id) {
        return Err(Error::Validation(
            "Selected package is not offered for this show".to_string(),
        ));
    }

    if slot.is_manually_closed {
        return Ok(SubmitOutcome::SlotClosed);
    }

    let guests = req.guests.max(1);

    let per_guest = package
        .price_per_guest(slot.price_tier.as_deref())
        .ok_or_else(|| {
            Error::NotFound(format!(
                "No price configured for package '{}' at tier '{}'",
                package.name,
                slot.price_tier.as_deref().unwrap_or("default")
            ))
        })?;

    let add_ons = package.selected_add_ons(&req.add_on_ids);
    if add_ons.len() != req.add_on_ids.len() {
        return Err(Error::Validation(
            "One or more selected add-ons do not belong to this package".to_string(),
        ));
    }

    let merchandise = resolve_merchandise(&tx, &req.merchandise)?;

    let subtotal = pricing::subtotal_cents(per_guest, guests, &add_ons, &merchandise);

    // Promo evaluation happens against the stored code inside the
    // transaction, so the usage-limit check and the increment below
    // cannot be raced apart
    let mut applied_promo = None;
    let mut discount = 0;
    if let Some(code) = req.promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
        let stored = PromoCodeStore::new(&tx).find_by_code(code)?;
        match promo::evaluate(stored.as_ref(), subtotal, chrono::Utc::now()) {
            Ok(amount) => {
                discount = amount;
                applied_promo = stored;
            }
            Err(rejection) => return Ok(SubmitOutcome::PromoRejected(rejection)),
        }
    }

    let quote = pricing::quote(per_guest, guests, &add_ons, &merchandise, discount);

    let decision = assess_capacity(slot.booked_count, slot.capacity, guests);

    let mut booking = Booking::new(
        slot.id,
        package.id,
        package.name.clone(),
        guests,
        req.customer_name.trim().to_string(),
        req.customer_email.trim().to_lowercase(),
    );
    booking.customer_phone = req.customer_phone.clone();
    booking.billing_address = req.billing_address.clone();
    booking.add_on_ids = add_ons.iter().map(|a| a.id).collect();
    booking.merchandise = merchandise;
    booking.total_price_cents = quote.total_cents;
    booking.discount_cents = quote.discount_cents;
    booking.applied_promo_code = applied_promo.as_ref().map(|p| p.code.clone());
    booking.idempotency_key = req.idempotency_key.clone();

    match decision {
        CapacityDecision::Fits => {
            booking.status = BookingStatus::Confirmed;
            booking.is_overbooking = false;
            booking.holds_capacity = true;
        }
        CapacityDecision::Overbooking => {
            booking.status = BookingStatus::PendingApproval;
            booking.is_overbooking = true;
            booking.holds_capacity = false;
        }
    }
    assert_booking_invariants(&booking);

    let contact = Customer::new(booking.customer_name.clone(), booking.customer_email.clone());
    let contact = match &req.customer_phone {
        Some(phone) => contact.with_phone(phone.clone()),
        None => contact,
    };
    CustomerStore::new(&tx).upsert_by_email(&contact)?;

    BookingStore::new(&tx).create(&booking)?;

    // Only a confirmed, non-overbooking party moves the counter
    if booking.holds_capacity {
        ShowStore::new(&tx).add_booked(slot.id, guests)?;
    }

    if let Some(promo) = &applied_promo {
        PromoCodeStore::new(&tx).increment_times_used(promo.id)?;
    }

    enqueue_notifications(&tx, &booking, &slot)?;

    audit(
        &tx,
        &Actor::Customer,
        "booking.submit",
        booking.id,
        format!(
            "{} for {} guests, status {}",
            booking.reservation_code,
            guests,
            booking.status.as_str()
        ),
    )?;

    tx.commit()?;

    info!(code = %booking.reservation_code, status = booking.status.as_str(), "Booking submitted");
    Ok(SubmitOutcome::Created(booking))
}

fn validate(req: &SubmitRequest) -> Result<()> {
    if req.customer_name.trim().is_empty() {
        return Err(Error::Validation("Customer name is required".to_string()));
    }
    let email = req.customer_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation("A valid email is required".to_string()));
    }
    for selection in &req.merchandise {
        if selection.quantity == 0 {
            return Err(Error::Validation(
                "Merchandise quantity must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

/// Price merchandise picks from the catalog, denormalizing name and unit
/// price onto the booking line
fn resolve_merchandise(
    tx: &Transaction<'_>,
    selections: &[MerchandiseSelection],
) -> Result<Vec<MerchandiseLine>> {
    let store = MerchandiseStore::new(tx);
    let mut lines = Vec::with_capacity(selections.len());
    for selection in selections {
        let item = store
            .find_by_id(selection.merchandise_id)?
            .filter(|i| i.is_active)
            .ok_or_else(|| {
                Error::NotFound(format!("Merchandise item {}", selection.merchandise_id))
            })?;
        lines.push(MerchandiseLine {
            merchandise_id: item.id,
            name: item.name,
            unit_price_cents: item.unit_price_cents,
            quantity: selection.quantity,
        });
    }
    Ok(lines)
}

/// Queue the customer confirmation and the admin alert. Written in the
/// booking's transaction; delivered later by the app-side dispatcher, so
/// mail trouble can never block or roll back a booking.
fn enqueue_notifications(tx: &Transaction<'_>, booking: &Booking, slot: &ShowSlot) -> Result<()> {
    let outbox = OutboxStore::new(tx);

    let when = format!("{} at {}", slot.date.format("%A, %e %B %Y"), slot.time.format("%H:%M"));

    let (subject, body) = match booking.status {
        BookingStatus::Confirmed => (
            format!("Your reservation {} is confirmed", booking.reservation_code),
            format!(
                "Dear {},\n\nYour table for {} on {} is confirmed.\nPackage: {}\nTotal: {}.{:02}\n\nWe look forward to welcoming you.",
                booking.customer_name,
                booking.guests,
                when,
                booking.package_name,
                booking.total_price_cents / 100,
                booking.total_price_cents % 100,
            ),
        ),
        _ => (
            format!("We received your reservation request {}", booking.reservation_code),
            format!(
                "Dear {},\n\nYour request for {} guests on {} is waiting for confirmation by our team.\nWe will be in touch shortly.",
                booking.customer_name, booking.guests, when,
            ),
        ),
    };
    outbox.enqueue(&OutboxEntry::new(
        NotificationKind::CustomerConfirmation,
        booking.id,
        booking.customer_email.clone(),
        subject,
        body,
    ))?;

    let settings = SettingsStore::new(tx).load()?;
    if !settings.company_email.is_empty() {
        let subject = match booking.status {
            BookingStatus::PendingApproval => {
                format!("Overbooking request {} needs approval", booking.reservation_code)
            }
            _ => format!("New booking {}", booking.reservation_code),
        };
        outbox.enqueue(&OutboxEntry::new(
            NotificationKind::AdminAlert,
            booking.id,
            settings.company_email.clone(),
            subject,
            format!(
                "{} booked {} guests on {} ({}).",
                booking.customer_name,
                booking.guests,
                when,
                booking.status.as_str()
            ),
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desk::testutil::seeded_db;
    use crate::models::{MerchandiseItem, PromoCode, PromoKind};

    fn request(slot_id: Uuid, package_id: Uuid, guests: u32) -> SubmitRequest {
        SubmitRequest {
            show_slot_id: slot_id,
            package_id,
            guests,
            customer_name: "Ada Guest".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: None,
            billing_address: None,
            add_on_ids: Vec::new(),
            merchandise: Vec::new(),
            promo_code: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn test_party_past_capacity_goes_to_approval_and_counter_stays() {
        // capacity=10, booked=8, guests=3
        let (mut db, slot, package) = seeded_db();
        let outcome = submit_reservation(&mut db, &request(slot.id, package.id, 3)).unwrap();

        let booking = match outcome {
            SubmitOutcome::Created(b) => b,
            other => panic!("expected Created, got {:?}", other),
        };
        assert_eq!(booking.status, BookingStatus::PendingApproval);
        assert!(booking.is_overbooking);
        assert!(!booking.holds_capacity);

        let slot = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(slot.booked_count, 8);
    }

    #[test]
    fn test_fitting_party_confirms_and_moves_counter() {
        // capacity=10, booked=8, guests=2
        let (mut db, slot, package) = seeded_db();
        let outcome = submit_reservation(&mut db, &request(slot.id, package.id, 2)).unwrap();

        let booking = match outcome {
            SubmitOutcome::Created(b) => b,
            other => panic!("expected Created, got {:?}", other),
        };
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(!booking.is_overbooking);
        assert!(booking.holds_capacity);
        assert_eq!(booking.total_price_cents, 2 * 8900);

        let slot = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(slot.booked_count, 10);

        // The submission left an audit trail in the same transaction
        let trail = db.audit().list_recent(10).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, "booking.submit");
    }

    #[test]
    fn test_zero_guests_is_treated_as_one() {
        let (mut db, slot, package) = seeded_db();
        let outcome = submit_reservation(&mut db, &request(slot.id, package.id, 0)).unwrap();
        match outcome {
            SubmitOutcome::Created(b) => assert_eq!(b.guests, 1),
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_slot_writes_nothing() {
        let (mut db, _slot, package) = seeded_db();
        let err = submit_reservation(&mut db, &request(Uuid::new_v4(), package.id, 2)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(db.bookings().list_by_status(BookingStatus::Confirmed).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_package_writes_nothing() {
        let (mut db, slot, _package) = seeded_db();
        let err = submit_reservation(&mut db, &request(slot.id, Uuid::new_v4(), 2)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_closed_slot_is_routed_to_waitlist_offer() {
        let (mut db, slot, package) = seeded_db();
        db.shows().set_manually_closed(slot.id, true).unwrap();

        let outcome = submit_reservation(&mut db, &request(slot.id, package.id, 2)).unwrap();
        assert!(matches!(outcome, SubmitOutcome::SlotClosed));

        let slot = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(slot.booked_count, 8);
    }

    #[test]
    fn test_duplicate_idempotency_key_returns_original() {
        let (mut db, slot, package) = seeded_db();
        let mut req = request(slot.id, package.id, 2);
        req.idempotency_key = Some("form-1".into());

        let first = match submit_reservation(&mut db, &req).unwrap() {
            SubmitOutcome::Created(b) => b,
            other => panic!("expected Created, got {:?}", other),
        };

        let second = match submit_reservation(&mut db, &req).unwrap() {
            SubmitOutcome::AlreadySubmitted(b) => b,
            other => panic!("expected AlreadySubmitted, got {:?}", other),
        };

        assert_eq!(first.id, second.id);
        // Counter moved exactly once
        let slot = db.shows().find_by_id(slot.id).unwrap().unwrap();
        assert_eq!(slot.booked_count, 10);
    }

    #[test]
    fn test_promo_applies_and_usage_is_counted() {
        let (mut db, slot, package) = seeded_db();
        let promo = PromoCode::new("TEN".into(), PromoKind::Percentage, 10);
        db.promo_codes().create(&promo).unwrap();

        let mut req = request(slot.id, package.id, 2);
        req.promo_code = Some("ten".into());

        let booking = match submit_reservation(&mut db, &req).unwrap() {
            SubmitOutcome::Created(b) => b,
            other => panic!("expected Created, got {:?}", other),
        };
        assert_eq!(booking.discount_cents, 17800 / 10);
        assert_eq!(booking.total_price_cents, 17800 - 1780);
        assert_eq!(booking.applied_promo_code.as_deref(), Some("TEN"));

        let promo = db.promo_codes().find_by_code("TEN").unwrap().unwrap();
        assert_eq!(promo.times_used, 1);
    }

    #[test]
    fn test_rejected_promo_blocks_the_booking() {
        let (mut db, slot, package) = seeded_db();
        let mut promo = PromoCode::new("DEAD".into(), PromoKind::Percentage, 10);
        promo.is_active = false;
        db.promo_codes().create(&promo).unwrap();

        let mut req = request(slot.id, package.id, 2);
        req.promo_code = Some("DEAD".into());

        let outcome = submit_reservation(&mut db, &req).unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::PromoRejected(PromoRejection::Inactive)
        ));
        assert!(db.bookings().list_for_slot(slot.id).unwrap().is_empty());
    }

    #[test]
    fn test_merchandise_is_priced_from_catalog() {
        let (mut db, slot, package) = seeded_db();
        let poster = MerchandiseItem::new("Poster".into(), 1200);
        db.merchandise().create(&poster).unwrap();

        let mut req = request(slot.id, package.id, 1);
        req.merchandise = vec![MerchandiseSelection {
            merchandise_id: poster.id,
            quantity: 2,
        }];

        let booking = match submit_reservation(&mut db, &req).unwrap() {
            SubmitOutcome::Created(b) => b,
            other => panic!("expected Created, got {:?}", other),
        };
        assert_eq!(booking.total_price_cents, 8900 + 2400);
        assert_eq!(booking.merchandise[0].name, "Poster");
    }

    #[test]
    fn test_notifications_are_queued_with_the_booking() {
        let (mut db, slot, package) = seeded_db();
        let mut settings = db.settings().load().unwrap();
        settings.company_email = "office@palace.example".into();
        db.settings().save(&settings).unwrap();

        submit_reservation(&mut db, &request(slot.id, package.id, 2)).unwrap();

        let due = db.outbox().list_due(chrono::Utc::now(), 10).unwrap();
        assert_eq!(due.len(), 2);
    }

    #[test]
    fn test_missing_price_tier_fails_before_any_write() {
        let (mut db, _slot, _package) = seeded_db();
        let tiered = crate::models::PackageOption::new("Premiere Menu".into())
            .with_price_level("premiere", 12900);
        db.packages().create(&tiered).unwrap();

        // Slot has no tier, package has no default level
        let slot = crate::desk::testutil::empty_slot(&db, 20);
        let err = submit_reservation(&mut db, &request(slot.id, tiered.id, 2)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(db.bookings().list_for_slot(slot.id).unwrap().is_empty());
    }
}
