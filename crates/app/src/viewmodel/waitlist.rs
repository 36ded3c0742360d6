//! Waiting list view model

use matinee_core::{desk, WaitingListEntry, WalkInRequest};
use uuid::Uuid;

use crate::state::{AppState, ToastLevel};

use super::{fail, FormOutcome};

/// Payload of the walk-in / waitlist form
#[derive(Debug, Clone, Default)]
pub struct WalkInForm {
    pub show_slot_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub guests: u32,
    pub notes: Option<String>,
}

/// Register a contact on the waiting list for a full or closed slot
pub fn register(state: &AppState, form: &WalkInForm) -> FormOutcome {
    let Some(slot_id) = form.show_slot_id else {
        state.push_toast(ToastLevel::Error, "Pick a show first");
        return FormOutcome::failed("Pick a show first");
    };

    let request = WalkInRequest {
        show_slot_id: slot_id,
        name: form.name.clone(),
        email: form.email.clone(),
        phone: form.phone.clone(),
        guests: form.guests,
        notes: form.notes.clone(),
    };

    let mut db = state.db.lock().unwrap();
    let result = desk::register_walk_in(&mut db, &request);
    drop(db);

    match result {
        Ok(entry) => {
            state.push_toast(
                ToastLevel::Success,
                format!("{} added to the waiting list", entry.name),
            );
            FormOutcome::ok("Added to the waiting list")
        }
        Err(e) => fail(state, &e),
    }
}

/// Open entries for a slot, in fairness order
pub fn open_entries(state: &AppState, slot_id: Uuid) -> Vec<WaitingListEntry> {
    let db = state.db.lock().unwrap();
    db.waitlist().list_open_for_slot(slot_id).unwrap_or_default()
}

/// Every entry for a slot, including consumed ones
pub fn all_entries(state: &AppState, slot_id: Uuid) -> Vec<WaitingListEntry> {
    let db = state.db.lock().unwrap();
    db.waitlist().list_for_slot(slot_id).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use matinee_core::ShowSlot;

    fn state_with_slot() -> (AppState, ShowSlot) {
        let state = AppState::in_memory().unwrap();
        let slot = {
            let db = state.db.lock().unwrap();
            let slot = ShowSlot::new(
                NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
                NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
                10,
            );
            db.shows().create(&slot).unwrap();
            slot
        };
        (state, slot)
    }

    fn form(slot_id: Uuid) -> WalkInForm {
        WalkInForm {
            show_slot_id: Some(slot_id),
            name: "Ben Waiting".into(),
            email: "ben@example.com".into(),
            guests: 3,
            ..WalkInForm::default()
        }
    }

    #[test]
    fn test_register_and_list() {
        let (state, slot) = state_with_slot();
        assert!(register(&state, &form(slot.id)).success);
        assert_eq!(open_entries(&state, slot.id).len(), 1);
    }

    #[test]
    fn test_register_without_slot_fails() {
        let (state, _slot) = state_with_slot();
        let mut f = form(Uuid::new_v4());
        f.show_slot_id = None;
        assert!(!register(&state, &f).success);
    }

    #[test]
    fn test_register_with_bad_email_fails_with_toast() {
        let (state, slot) = state_with_slot();
        let mut f = form(slot.id);
        f.email = "not-an-email".into();
        assert!(!register(&state, &f).success);
        assert!(!state.drain_toasts().is_empty());
    }
}
