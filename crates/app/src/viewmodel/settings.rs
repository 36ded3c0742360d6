//! Venue settings view model

use matinee_core::{AppSettings, DeskAction, PermissionMatrix, SettingsPatch};

use crate::state::{AppState, ToastLevel};

use super::{fail, require_actor, FormOutcome};

/// Current settings for the admin form
pub fn load(state: &AppState) -> AppSettings {
    let db = state.db.lock().unwrap();
    db.settings().load().unwrap_or_default()
}

/// Merge the form's changes over the stored settings
pub fn save(state: &AppState, patch: SettingsPatch) -> FormOutcome {
    let Some(actor) = require_actor(state) else {
        return FormOutcome::failed("Staff sign-in required");
    };
    if let matinee_core::Actor::Staff { role, .. } = actor {
        if !PermissionMatrix::can_perform(role, DeskAction::EditSettings) {
            state.push_toast(ToastLevel::Error, "Only the owner can edit settings");
            return FormOutcome::failed("Only the owner can edit settings");
        }
    }

    if let Some(rate) = patch.vat_rate_bps {
        if !(0..=10_000).contains(&rate) {
            state.push_toast(ToastLevel::Error, "VAT rate must be between 0% and 100%");
            return FormOutcome::failed("VAT rate must be between 0% and 100%");
        }
    }

    let db = state.db.lock().unwrap();
    let mut settings = match db.settings().load() {
        Ok(s) => s,
        Err(e) => {
            drop(db);
            return fail(state, &e);
        }
    };
    settings.apply(patch);
    let result = db.settings().save(&settings);
    drop(db);

    match result {
        Ok(()) => {
            state.push_toast(ToastLevel::Success, "Settings saved");
            FormOutcome::ok("Settings saved")
        }
        Err(e) => fail(state, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matinee_core::{StaffMember, StaffRole};

    fn state_as(role: StaffRole) -> AppState {
        let state = AppState::in_memory().unwrap();
        let staff = StaffMember::new("Jo".into(), "jo".into(), "hash".into(), role);
        state.set_current_staff(Some(staff));
        state
    }

    #[test]
    fn test_owner_saves_patch() {
        let state = state_as(StaffRole::Owner);
        let outcome = save(
            &state,
            SettingsPatch {
                company_name: Some("Palace Varieté".into()),
                vat_rate_bps: Some(700),
                ..SettingsPatch::default()
            },
        );
        assert!(outcome.success);

        let settings = load(&state);
        assert_eq!(settings.company_name, "Palace Varieté");
        assert_eq!(settings.vat_rate_bps, 700);
        // Untouched fields keep their defaults
        assert_eq!(settings.invoice_prefix, "INV");
    }

    #[test]
    fn test_manager_cannot_edit_settings() {
        let state = state_as(StaffRole::Manager);
        let outcome = save(
            &state,
            SettingsPatch {
                company_name: Some("Nope".into()),
                ..SettingsPatch::default()
            },
        );
        assert!(!outcome.success);
    }

    #[test]
    fn test_absurd_vat_rate_is_rejected() {
        let state = state_as(StaffRole::Owner);
        let outcome = save(
            &state,
            SettingsPatch {
                vat_rate_bps: Some(25_000),
                ..SettingsPatch::default()
            },
        );
        assert!(!outcome.success);
    }
}
