//! Invoice screens view model

use matinee_core::{billing, Invoice};
use uuid::Uuid;

use crate::state::{AppState, ToastLevel};

use super::{fail, require_actor, FormOutcome};

/// Create a draft invoice for a confirmed booking
pub fn create_for_booking(state: &AppState, booking_id: Uuid) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = billing::create_invoice(&mut db, booking_id, &actor);
    drop(db);

    match result {
        Ok(invoice) => {
            state.push_toast(
                ToastLevel::Success,
                format!("Invoice {} created", invoice.invoice_number),
            );
            FormOutcome::ok(invoice.invoice_number)
        }
        Err(e) => fail(state, &e),
    }
}

/// Mark a draft invoice sent
pub fn mark_sent(state: &AppState, invoice_id: Uuid) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = billing::mark_sent(&mut db, invoice_id, &actor);
    drop(db);

    match result {
        Ok(()) => FormOutcome::ok("Invoice sent"),
        Err(e) => fail(state, &e),
    }
}

/// Record a payment against a sent or overdue invoice
pub fn record_payment(state: &AppState, invoice_id: Uuid) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = billing::record_payment(&mut db, invoice_id, &actor);
    drop(db);

    match result {
        Ok(()) => {
            state.push_toast(ToastLevel::Success, "Payment recorded");
            FormOutcome::ok("Payment recorded")
        }
        Err(e) => fail(state, &e),
    }
}

/// Issue a credit note and mark the original credited
pub fn credit(state: &AppState, invoice_id: Uuid) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };

    let mut db = state.db.lock().unwrap();
    let result = billing::credit_invoice(&mut db, invoice_id, &actor);
    drop(db);

    match result {
        Ok(note) => {
            state.push_toast(
                ToastLevel::Info,
                format!("Credit note {} issued", note.invoice_number),
            );
            FormOutcome::ok(note.invoice_number)
        }
        Err(e) => fail(state, &e),
    }
}

/// All invoices, newest first
pub fn list(state: &AppState) -> Vec<Invoice> {
    let db = state.db.lock().unwrap();
    db.invoices().list_all().unwrap_or_default()
}
