//! Staff and shift rota view model

use chrono::{NaiveDate, NaiveTime};
use matinee_core::{
    DeskAction, PermissionMatrix, ScheduledShift, StaffMember, StaffRole,
};
use uuid::Uuid;

use crate::state::{AppState, ToastLevel};

use super::{fail, require_actor, FormOutcome};

/// Payload of the new-account form
#[derive(Debug, Clone)]
pub struct StaffForm {
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: StaffRole,
}

fn guard(state: &AppState, action: DeskAction) -> Result<(), FormOutcome> {
    let Some(actor) = require_actor(state) else {
        return Err(FormOutcome::failed("Staff sign-in required"));
    };
    if let matinee_core::Actor::Staff { role, .. } = actor {
        if !PermissionMatrix::can_perform(role, action) {
            state.push_toast(ToastLevel::Error, "Not allowed for your role");
            return Err(FormOutcome::failed("Not allowed for your role"));
        }
    }
    Ok(())
}

/// Create a staff account with a hashed password
pub fn create(state: &AppState, form: &StaffForm) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::ManageStaff) {
        return denied;
    }
    if form.username.trim().is_empty() || form.password.len() < 8 {
        state.push_toast(
            ToastLevel::Error,
            "Username and a password of at least 8 characters are required",
        );
        return FormOutcome::failed("Username and a password of at least 8 characters are required");
    }

    let hash = match StaffMember::hash_password(&form.password) {
        Ok(h) => h,
        Err(e) => return fail(state, &e),
    };
    let staff = StaffMember::new(
        form.name.clone(),
        form.username.trim().to_string(),
        hash,
        form.role,
    );

    let db = state.db.lock().unwrap();
    let result = db.staff().create(&staff);
    drop(db);

    match result {
        Ok(()) => {
            state.push_toast(ToastLevel::Success, format!("Account {} created", staff.username));
            FormOutcome::ok("Account created")
        }
        Err(e) => fail(state, &e),
    }
}

/// Deactivate an account, keeping its history
pub fn deactivate(state: &AppState, staff_id: Uuid) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::ManageStaff) {
        return denied;
    }

    let db = state.db.lock().unwrap();
    let result = db.staff().set_active(staff_id, false);
    drop(db);

    match result {
        Ok(()) => FormOutcome::ok("Account deactivated"),
        Err(e) => fail(state, &e),
    }
}

/// All accounts for the admin list
pub fn list(state: &AppState) -> Vec<StaffMember> {
    let db = state.db.lock().unwrap();
    db.staff().list_all().unwrap_or_default()
}

/// Payload of the rota editor
#[derive(Debug, Clone)]
pub struct ShiftForm {
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub starts: NaiveTime,
    pub ends: NaiveTime,
    pub duty: String,
    pub notes: Option<String>,
}

/// Put a shift on the rota
pub fn add_shift(state: &AppState, form: &ShiftForm) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::ManageShifts) {
        return denied;
    }
    if form.ends <= form.starts {
        state.push_toast(ToastLevel::Error, "Shift must end after it starts");
        return FormOutcome::failed("Shift must end after it starts");
    }

    let mut shift = ScheduledShift::new(form.staff_id, form.date, form.starts, form.ends, form.duty.clone());
    shift.notes = form.notes.clone();

    let db = state.db.lock().unwrap();
    let result = db.staff().create_shift(&shift);
    drop(db);

    match result {
        Ok(()) => FormOutcome::ok("Shift added"),
        Err(e) => fail(state, &e),
    }
}

/// Remove a shift from the rota
pub fn remove_shift(state: &AppState, shift_id: Uuid) -> FormOutcome {
    if let Err(denied) = guard(state, DeskAction::ManageShifts) {
        return denied;
    }

    let db = state.db.lock().unwrap();
    let result = db.staff().delete_shift(shift_id);
    drop(db);

    match result {
        Ok(()) => FormOutcome::ok("Shift removed"),
        Err(e) => fail(state, &e),
    }
}

/// Rota for one week starting at `monday`
pub fn week_rota(state: &AppState, monday: NaiveDate) -> Vec<ScheduledShift> {
    let db = state.db.lock().unwrap();
    db.staff()
        .list_shifts_between(monday, monday + chrono::Duration::days(6))
        .unwrap_or_default()
}
