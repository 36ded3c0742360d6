//! Show administration view model

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use matinee_core::{DeskAction, PermissionMatrix, ShowSlot};
use uuid::Uuid;

use crate::state::{AppState, ToastLevel};

use super::{fail, require_actor, FormOutcome};

/// Payload for creating a single show slot
#[derive(Debug, Clone)]
pub struct ShowForm {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub capacity: u32,
    pub package_ids: Vec<Uuid>,
    pub price_tier: Option<String>,
}

/// Payload for bulk-creating a run of shows
#[derive(Debug, Clone)]
pub struct ShowRunForm {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Weekdays the show plays on
    pub weekdays: Vec<Weekday>,
    pub time: NaiveTime,
    pub capacity: u32,
    pub package_ids: Vec<Uuid>,
    pub price_tier: Option<String>,
}

/// Resolve the signed-in actor and check the permission matrix; the Err
/// side carries the ready-made failure outcome
fn guard(state: &AppState, action: DeskAction) -> Result<matinee_core::Actor, FormOutcome> {
    let Some(actor) = require_actor(state) else {
        return Err(FormOutcome::failed("Staff sign-in required"));
    };
    if let matinee_core::Actor::Staff { role, .. } = actor {
        if !PermissionMatrix::can_perform(role, action) {
            state.push_toast(ToastLevel::Error, "Not allowed for your role");
            return Err(FormOutcome::failed("Not allowed for your role"));
        }
    }
    Ok(actor)
}

/// Create one show slot
pub fn create_show(state: &AppState, form: &ShowForm) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::EditShows) {
        return denied;
    }
    if form.capacity == 0 {
        state.push_toast(ToastLevel::Error, "Capacity must be at least 1");
        return FormOutcome::failed("Capacity must be at least 1");
    }

    let mut slot = ShowSlot::new(form.date, form.time, form.capacity)
        .with_packages(form.package_ids.clone());
    if let Some(tier) = &form.price_tier {
        slot = slot.with_price_tier(tier.clone());
    }

    let db = state.db.lock().unwrap();
    let result = db.shows().create(&slot);
    drop(db);

    match result {
        Ok(()) => {
            state.patch_slot(slot);
            state.push_toast(ToastLevel::Success, "Show created");
            FormOutcome::ok("Show created")
        }
        Err(e) => fail(state, &e),
    }
}

/// Create a whole run of shows across a date range, one per matching
/// weekday. Returns how many were created in the message.
pub fn create_show_run(state: &AppState, form: &ShowRunForm) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::EditShows) {
        return denied;
    }
    if form.last_date < form.first_date {
        state.push_toast(ToastLevel::Error, "Run ends before it starts");
        return FormOutcome::failed("Run ends before it starts");
    }
    if form.weekdays.is_empty() {
        state.push_toast(ToastLevel::Error, "Pick at least one weekday");
        return FormOutcome::failed("Pick at least one weekday");
    }

    let db = state.db.lock().unwrap();
    let mut created = 0u32;
    let mut date = form.first_date;
    while date <= form.last_date {
        if form.weekdays.contains(&date.weekday()) {
            let mut slot = ShowSlot::new(date, form.time, form.capacity)
                .with_packages(form.package_ids.clone());
            if let Some(tier) = &form.price_tier {
                slot = slot.with_price_tier(tier.clone());
            }
            if let Err(e) = db.shows().create(&slot) {
                drop(db);
                return fail(state, &e);
            }
            created += 1;
        }
        date += Duration::days(1);
    }
    drop(db);

    let _ = state.reload_slots();
    state.push_toast(ToastLevel::Success, format!("Created {} shows", created));
    FormOutcome::ok(format!("Created {} shows", created))
}

/// Open or close a slot for direct booking
pub fn set_closed(state: &AppState, slot_id: Uuid, closed: bool) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::EditShows) {
        return denied;
    }

    let db = state.db.lock().unwrap();
    let result = db.shows().set_manually_closed(slot_id, closed);
    drop(db);

    match result {
        Ok(()) => {
            state.refresh_slot(slot_id);
            FormOutcome::ok(if closed { "Show closed" } else { "Show reopened" })
        }
        Err(e) => fail(state, &e),
    }
}

/// Delete a slot. Refused while any booking still holds capacity in it;
/// cancel or move those bookings first.
pub fn delete_show(state: &AppState, slot_id: Uuid) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::DeleteShows) {
        return denied;
    }

    let db = state.db.lock().unwrap();
    let holding = match db.bookings().count_holding_capacity(slot_id) {
        Ok(n) => n,
        Err(e) => {
            drop(db);
            return fail(state, &e);
        }
    };
    if holding > 0 {
        drop(db);
        let message = format!("{} confirmed bookings still reference this show", holding);
        state.push_toast(ToastLevel::Error, message.clone());
        return FormOutcome::failed(message);
    }

    let result = db.shows().delete(slot_id);
    drop(db);

    match result {
        Ok(()) => {
            let _ = state.reload_slots();
            state.push_toast(ToastLevel::Info, "Show deleted");
            FormOutcome::ok("Show deleted")
        }
        Err(e) => fail(state, &e),
    }
}

/// Upcoming slots for the calendar screen
pub fn upcoming_shows(state: &AppState) -> Vec<ShowSlot> {
    state.reload_slots().unwrap_or_default()
}
