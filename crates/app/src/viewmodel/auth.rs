//! Staff sign-in view model

use crate::state::{AppState, ToastLevel};

/// Verify credentials and establish the signed-in staff member.
/// Failure reasons surface as toasts only; the form just sees `false`.
pub fn sign_in(state: &AppState, username: &str, password: &str) -> bool {
    let db = state.db.lock().unwrap();

    let staff = match db.staff().find_by_username(username.trim()) {
        Ok(Some(s)) => s,
        Ok(None) => {
            drop(db);
            state.push_toast(ToastLevel::Error, "Unknown username");
            return false;
        }
        Err(e) => {
            drop(db);
            state.push_toast(ToastLevel::Error, format!("Sign-in failed: {}", e));
            return false;
        }
    };

    if !staff.is_active {
        drop(db);
        state.push_toast(ToastLevel::Error, "This account is deactivated");
        return false;
    }

    if !staff.verify_password(password) {
        drop(db);
        state.push_toast(ToastLevel::Error, "Wrong password");
        return false;
    }

    let _ = db.staff().update_last_login(staff.id);
    drop(db);

    state.push_toast(ToastLevel::Success, format!("Welcome back, {}", staff.name));
    state.set_current_staff(Some(staff));
    true
}

pub fn sign_out(state: &AppState) {
    state.set_current_staff(None);
}
