//! Promo code administration view model

use chrono::{DateTime, Utc};
use matinee_core::{
    generate_promo_code, promo, DeskAction, PermissionMatrix, PromoCode, PromoKind,
};

use crate::state::{AppState, ToastLevel};

use super::{fail, require_actor, FormOutcome};

/// Payload of the promo code editor
#[derive(Debug, Clone)]
pub struct PromoForm {
    /// Blank generates a random 8-character code
    pub code: String,
    pub kind: PromoKind,
    pub value: i64,
    pub usage_limit: Option<u32>,
    pub min_booking_cents: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

fn guard(state: &AppState) -> Result<(), FormOutcome> {
    let Some(actor) = require_actor(state) else {
        return Err(FormOutcome::failed("Staff sign-in required"));
    };
    if let matinee_core::Actor::Staff { role, .. } = actor {
        if !PermissionMatrix::can_perform(role, DeskAction::ManagePromoCodes) {
            state.push_toast(ToastLevel::Error, "Not allowed for your role");
            return Err(FormOutcome::failed("Not allowed for your role"));
        }
    }
    Ok(())
}

/// Create a promo code, generating the code string when left blank
pub fn create(state: &AppState, form: &PromoForm) -> FormOutcome {
    if let Err(denied) = guard(state) {
        return denied;
    }
    if form.value <= 0 {
        state.push_toast(ToastLevel::Error, "Value must be positive");
        return FormOutcome::failed("Value must be positive");
    }
    if form.kind == PromoKind::Percentage && form.value > 100 {
        state.push_toast(ToastLevel::Error, "Percentage cannot exceed 100");
        return FormOutcome::failed("Percentage cannot exceed 100");
    }

    let code = if form.code.trim().is_empty() {
        generate_promo_code()
    } else {
        form.code.trim().to_string()
    };

    let mut promo = PromoCode::new(code, form.kind, form.value);
    promo.usage_limit = form.usage_limit;
    promo.min_booking_cents = form.min_booking_cents;
    promo.expires_at = form.expires_at;

    let db = state.db.lock().unwrap();
    let result = db.promo_codes().create(&promo);
    drop(db);

    match result {
        Ok(()) => {
            state.push_toast(ToastLevel::Success, format!("Code {} created", promo.code));
            FormOutcome::ok(promo.code)
        }
        Err(e) => fail(state, &e),
    }
}

/// Deactivate a code without deleting its redemption history
pub fn deactivate(state: &AppState, code: &str) -> FormOutcome {
    if let Err(denied) = guard(state) {
        return denied;
    }

    let db = state.db.lock().unwrap();
    let found = match db.promo_codes().find_by_code(code) {
        Ok(found) => found,
        Err(e) => {
            drop(db);
            return fail(state, &e);
        }
    };
    let Some(mut promo) = found else {
        drop(db);
        state.push_toast(ToastLevel::Error, "Unknown promo code");
        return FormOutcome::failed("Unknown promo code");
    };

    promo.is_active = false;
    let result = db.promo_codes().update(&promo);
    drop(db);

    match result {
        Ok(()) => FormOutcome::ok("Code deactivated"),
        Err(e) => fail(state, &e),
    }
}

/// Dry-run a code against a subtotal for live form feedback; never
/// mutates usage
pub fn preview(state: &AppState, code: &str, subtotal_cents: i64) -> Result<i64, String> {
    let db = state.db.lock().unwrap();
    let stored = db
        .promo_codes()
        .find_by_code(code)
        .map_err(|e| e.to_string())?;
    drop(db);

    promo::evaluate(stored.as_ref(), subtotal_cents, Utc::now()).map_err(|r| r.to_string())
}

/// All codes for the admin list
pub fn list(state: &AppState) -> Vec<PromoCode> {
    let db = state.db.lock().unwrap();
    db.promo_codes().list_all().unwrap_or_default()
}
