//! Invoice construction and lifecycle
//!
//! Booking prices are VAT-inclusive; an invoice decomposes the gross
//! amount into net and VAT at the venue's configured rate. Numbering
//! consumes the settings counter inside the creating transaction, so
//! numbers are strictly increasing and gapless.

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::assert_invoice_invariants;
use crate::models::{AppSettings, Booking, BookingStatus, Invoice, InvoiceLine, InvoiceStatus};
use crate::permissions::DeskAction;
use crate::storage::{BookingStore, Database, InvoiceStore, SettingsStore};

use crate::desk::Actor;

/// Split a VAT-inclusive amount into net and VAT at `rate_bps`
pub fn decompose_vat(gross_cents: i64, rate_bps: i64) -> (i64, i64) {
    let net = gross_cents * 10_000 / (10_000 + rate_bps);
    (net, gross_cents - net)
}

/// Format an invoice number like `INV-2026-0042`
pub fn format_invoice_number(prefix: &str, year: i32, sequence: u32) -> String {
    format!("{}-{}-{:04}", prefix, year, sequence)
}

/// Assemble the billing document for a booking. Pure; persistence and
/// numbering happen in `create_invoice`.
pub fn build_invoice(
    booking: &Booking,
    settings: &AppSettings,
    invoice_number: String,
    now: DateTime<Utc>,
) -> Invoice {
    let merch_total: i64 = booking.merchandise.iter().map(|l| l.subtotal_cents()).sum();
    let package_portion = booking.total_price_cents + booking.discount_cents - merch_total;

    let mut lines = vec![InvoiceLine {
        description: format!("{} for {} guests", booking.package_name, booking.guests),
        quantity: 1,
        unit_price_cents: package_portion,
        amount_cents: package_portion,
    }];
    for line in &booking.merchandise {
        lines.push(InvoiceLine {
            description: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            amount_cents: line.subtotal_cents(),
        });
    }
    if booking.discount_cents > 0 {
        lines.push(InvoiceLine {
            description: match &booking.applied_promo_code {
                Some(code) => format!("Discount ({})", code),
                None => "Discount".to_string(),
            },
            quantity: 1,
            unit_price_cents: -booking.discount_cents,
            amount_cents: -booking.discount_cents,
        });
    }

    let gross = booking.total_price_cents;
    let (net, vat) = decompose_vat(gross, settings.vat_rate_bps);

    let invoice = Invoice {
        id: Uuid::new_v4(),
        invoice_number,
        booking_id: booking.id,
        customer_name: booking.customer_name.clone(),
        billing_address: booking.billing_address.clone(),
        lines,
        net_cents: net,
        vat_cents: vat,
        gross_cents: gross,
        vat_rate_bps: settings.vat_rate_bps,
        status: InvoiceStatus::Draft,
        credit_of: None,
        issued_at: now,
        due_at: now + Duration::days(settings.invoice_due_days),
        sent_at: None,
        paid_at: None,
    };
    assert_invoice_invariants(&invoice);
    invoice
}

/// Create a draft invoice for a confirmed booking
#[instrument(skip(db, actor))]
pub fn create_invoice(db: &mut Database, booking_id: Uuid, actor: &Actor) -> Result<Invoice> {
    actor.require(DeskAction::IssueInvoices)?;

    let tx = db.transaction()?;

    let booking = BookingStore::new(&tx)
        .find_by_id(booking_id)?
        .ok_or_else(|| Error::NotFound(format!("Booking {}", booking_id)))?;
    if booking.status != BookingStatus::Confirmed {
        return Err(Error::InvalidOperation(format!(
            "Only confirmed bookings can be invoiced; {} is {}",
            booking.reservation_code,
            booking.status.as_str()
        )));
    }

    let invoices = InvoiceStore::new(&tx);
    let already_live = invoices
        .find_by_booking(booking.id)?
        .into_iter()
        .any(|i| i.status != InvoiceStatus::Credited && !i.is_credit_note());
    if already_live {
        return Err(Error::InvalidOperation(format!(
            "Booking {} already has an open invoice",
            booking.reservation_code
        )));
    }

    let settings_store = SettingsStore::new(&tx);
    let settings = settings_store.load()?;
    let sequence = settings_store.next_invoice_number()?;
    let now = Utc::now();
    let number = format_invoice_number(&settings.invoice_prefix, now.year(), sequence);

    let invoice = build_invoice(&booking, &settings, number, now);
    invoices.create(&invoice)?;

    crate::storage::AuditStore::new(&tx).append(&crate::models::AuditLogEntry::new(
        actor.audit_name(),
        "invoice.create",
        Some(invoice.id),
        format!("{} for {}", invoice.invoice_number, booking.reservation_code),
    ))?;
    tx.commit()?;

    info!(number = %invoice.invoice_number, "Invoice created");
    Ok(invoice)
}

/// Mark a draft invoice as sent
#[instrument(skip(db, actor))]
pub fn mark_sent(db: &mut Database, invoice_id: Uuid, actor: &Actor) -> Result<()> {
    actor.require(DeskAction::IssueInvoices)?;

    let invoice = db
        .invoices()
        .find_by_id(invoice_id)?
        .ok_or_else(|| Error::NotFound(format!("Invoice {}", invoice_id)))?;
    if invoice.status != InvoiceStatus::Draft {
        return Err(Error::InvalidOperation(format!(
            "Invoice {} is {}, not draft",
            invoice.invoice_number,
            invoice.status.as_str()
        )));
    }

    db.invoices()
        .set_status(invoice_id, InvoiceStatus::Sent, Some(Utc::now()), None)?;
    Ok(())
}

/// Record payment of a sent or overdue invoice
#[instrument(skip(db, actor))]
pub fn record_payment(db: &mut Database, invoice_id: Uuid, actor: &Actor) -> Result<()> {
    actor.require(DeskAction::RecordPayments)?;

    let invoice = db
        .invoices()
        .find_by_id(invoice_id)?
        .ok_or_else(|| Error::NotFound(format!("Invoice {}", invoice_id)))?;
    if !matches!(invoice.status, InvoiceStatus::Sent | InvoiceStatus::Overdue) {
        return Err(Error::InvalidOperation(format!(
            "Invoice {} is {} and cannot be paid",
            invoice.invoice_number,
            invoice.status.as_str()
        )));
    }

    db.invoices()
        .set_status(invoice_id, InvoiceStatus::Paid, None, Some(Utc::now()))?;
    Ok(())
}

/// Flip sent invoices past their due date to overdue. Returns how many
/// moved; run from the app shell's maintenance pass.
#[instrument(skip(db))]
pub fn sweep_overdue(db: &mut Database, now: DateTime<Utc>) -> Result<u32> {
    let due = db.invoices().list_due_before(now)?;
    let mut moved = 0;
    for invoice in due {
        db.invoices()
            .set_status(invoice.id, InvoiceStatus::Overdue, None, None)?;
        moved += 1;
    }
    Ok(moved)
}

/// Issue a credit note: a new invoice with negated amounts linked to the
/// original, which is marked credited.
#[instrument(skip(db, actor))]
pub fn credit_invoice(db: &mut Database, invoice_id: Uuid, actor: &Actor) -> Result<Invoice> {
    actor.require(DeskAction::CreditInvoices)?;

    let tx = db.transaction()?;

    let invoices = InvoiceStore::new(&tx);
    let original = invoices
        .find_by_id(invoice_id)?
        .ok_or_else(|| Error::NotFound(format!("Invoice {}", invoice_id)))?;
    if original.is_credit_note() {
        return Err(Error::InvalidOperation(
            "Cannot credit a credit note".to_string(),
        ));
    }
    if original.status == InvoiceStatus::Credited {
        return Err(Error::InvalidOperation(format!(
            "Invoice {} is already credited",
            original.invoice_number
        )));
    }

    let settings_store = SettingsStore::new(&tx);
    let settings = settings_store.load()?;
    let sequence = settings_store.next_invoice_number()?;
    let now = Utc::now();

    let note = Invoice {
        id: Uuid::new_v4(),
        invoice_number: format_invoice_number(&settings.invoice_prefix, now.year(), sequence),
        booking_id: original.booking_id,
        customer_name: original.customer_name.clone(),
        billing_address: original.billing_address.clone(),
        lines: original
            .lines
            .iter()
            .map(|l| InvoiceLine {
                description: format!("Credit: {}", l.description),
                quantity: l.quantity,
                unit_price_cents: -l.unit_price_cents,
                amount_cents: -l.amount_cents,
            })
            .collect(),
        net_cents: -original.net_cents,
        vat_cents: -original.vat_cents,
        gross_cents: -original.gross_cents,
        vat_rate_bps: original.vat_rate_bps,
        status: InvoiceStatus::Draft,
        credit_of: Some(original.id),
        issued_at: now,
        due_at: now,
        sent_at: None,
        paid_at: None,
    };
    invoices.create(&note)?;
    invoices.set_status(original.id, InvoiceStatus::Credited, None, None)?;

    crate::storage::AuditStore::new(&tx).append(&crate::models::AuditLogEntry::new(
        actor.audit_name(),
        "invoice.credit",
        Some(original.id),
        format!("{} credited by {}", original.invoice_number, note.invoice_number),
    ))?;
    tx.commit()?;

    info!(number = %note.invoice_number, "Credit note issued");
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desk::{submit_reservation, SubmitOutcome, SubmitRequest};
    use crate::desk::testutil::{box_office, manager, seeded_db};
    use crate::storage::Database;

    fn confirmed_booking(db: &mut Database) -> Booking {
        let slot = crate::desk::testutil::empty_slot(db, 20);
        let package = db.packages().list_active().unwrap().remove(0);
        let req = SubmitRequest {
            show_slot_id: slot.id,
            package_id: package.id,
            guests: 2,
            customer_name: "Ada Guest".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: None,
            billing_address: Some("1 Stage Lane".into()),
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

    #[test]
    fn test_vat_decomposition() {
        // 119.00 gross at 19% -> 100.00 net + 19.00 VAT
        assert_eq!(decompose_vat(11_900, 1_900), (10_000, 1_900));
        assert_eq!(decompose_vat(0, 1_900), (0, 0));
    }

    #[test]
    fn test_vat_decomposition_always_sums_to_gross() {
        for gross in [1, 99, 101, 12_345, 99_999] {
            let (net, vat) = decompose_vat(gross, 1_900);
            assert_eq!(net + vat, gross);
        }
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(format_invoice_number("INV", 2026, 42), "INV-2026-0042");
    }

    #[test]
    fn test_build_invoice_lines_sum_to_gross() {
        let (mut db, _slot, _package) = seeded_db();
        let mut booking = confirmed_booking(&mut db);
        booking.discount_cents = 1_000;
        booking.total_price_cents -= 1_000;
        booking.applied_promo_code = Some("TEN".into());

        let settings = AppSettings::default();
        let invoice = build_invoice(&booking, &settings, "INV-2026-0001".into(), Utc::now());

        let sum: i64 = invoice.lines.iter().map(|l| l.amount_cents).sum();
        assert_eq!(sum, invoice.gross_cents);
        assert_eq!(invoice.net_cents + invoice.vat_cents, invoice.gross_cents);
        assert_eq!(invoice.lines.len(), 2);
    }

    #[test]
    fn test_invoice_numbers_are_sequential() {
        let (mut db, _slot, _package) = seeded_db();
        let first_booking = confirmed_booking(&mut db);
        let first = create_invoice(&mut db, first_booking.id, &manager()).unwrap();
        credit_invoice(&mut db, first.id, &manager()).unwrap();
        let second = create_invoice(&mut db, first_booking.id, &manager()).unwrap();

        let seq = |n: &str| n.rsplit('-').next().unwrap().parse::<u32>().unwrap();
        // first invoice, its credit note, then the reissue
        assert_eq!(seq(&first.invoice_number), 1);
        assert_eq!(seq(&second.invoice_number), 3);
    }

    #[test]
    fn test_only_confirmed_bookings_are_invoiced() {
        let (mut db, slot, package) = seeded_db();
        let req = SubmitRequest {
            show_slot_id: slot.id,
            package_id: package.id,
            guests: 3,
            customer_name: "Ada Guest".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: None,
            billing_address: None,
            add_on_ids: Vec::new(),
            merchandise: Vec::new(),
            promo_code: None,
            idempotency_key: None,
        };
        let pending = match submit_reservation(&mut db, &req).unwrap() {
            SubmitOutcome::Created(b) => b,
            other => panic!("expected Created, got {:?}", other),
        };

        let err = create_invoice(&mut db, pending.id, &manager()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_double_invoicing_is_refused() {
        let (mut db, _slot, _package) = seeded_db();
        let booking = confirmed_booking(&mut db);
        create_invoice(&mut db, booking.id, &manager()).unwrap();
        let err = create_invoice(&mut db, booking.id, &manager()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_lifecycle_draft_sent_paid() {
        let (mut db, _slot, _package) = seeded_db();
        let booking = confirmed_booking(&mut db);
        let invoice = create_invoice(&mut db, booking.id, &manager()).unwrap();

        mark_sent(&mut db, invoice.id, &manager()).unwrap();
        record_payment(&mut db, invoice.id, &box_office()).unwrap();

        let stored = db.invoices().find_by_id(invoice.id).unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert!(stored.sent_at.is_some());
        assert!(stored.paid_at.is_some());
    }

    #[test]
    fn test_paying_a_draft_is_invalid() {
        let (mut db, _slot, _package) = seeded_db();
        let booking = confirmed_booking(&mut db);
        let invoice = create_invoice(&mut db, booking.id, &manager()).unwrap();
        let err = record_payment(&mut db, invoice.id, &box_office()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_overdue_sweep() {
        let (mut db, _slot, _package) = seeded_db();
        let booking = confirmed_booking(&mut db);
        let invoice = create_invoice(&mut db, booking.id, &manager()).unwrap();
        mark_sent(&mut db, invoice.id, &manager()).unwrap();

        // Not yet due
        assert_eq!(sweep_overdue(&mut db, Utc::now()).unwrap(), 0);

        let past_due = Utc::now() + Duration::days(30);
        assert_eq!(sweep_overdue(&mut db, past_due).unwrap(), 1);
        let stored = db.invoices().find_by_id(invoice.id).unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn test_credit_note_negates_and_links() {
        let (mut db, _slot, _package) = seeded_db();
        let booking = confirmed_booking(&mut db);
        let invoice = create_invoice(&mut db, booking.id, &manager()).unwrap();

        let note = credit_invoice(&mut db, invoice.id, &manager()).unwrap();
        assert_eq!(note.gross_cents, -invoice.gross_cents);
        assert_eq!(note.credit_of, Some(invoice.id));

        let original = db.invoices().find_by_id(invoice.id).unwrap().unwrap();
        assert_eq!(original.status, InvoiceStatus::Credited);

        let err = credit_invoice(&mut db, note.id, &manager()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }
}
