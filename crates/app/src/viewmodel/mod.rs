//! View-model layer
//!
//! Form-level handlers the UI shell binds to. Each handler validates its
//! payload, calls into the core, converts every failure into a toast and
//! a flat `{success}` outcome, and patches the cached slot list so the
//! screen reflects the change before the next reload. Typed errors stop
//! here; screens never see them.

pub mod auth;
pub mod bookings;
pub mod invoices;
pub mod promos;
pub mod reports;
pub mod settings;
pub mod shows;
pub mod staff;
pub mod waitlist;

use matinee_core::{BookingStatus, Error};

use crate::state::{AppState, ToastLevel};

/// Flat result shape handed back to screens
#[derive(Debug, Clone)]
pub struct FormOutcome {
    pub success: bool,
    pub message: String,
}

impl FormOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Submission outcome; `PendingApproval` is still a success for the form
#[derive(Debug, Clone)]
pub struct SubmitFormOutcome {
    pub success: bool,
    pub status: Option<BookingStatus>,
    pub reservation_code: Option<String>,
    pub message: String,
}

/// Convert a core error into a toast and a failed outcome
pub(crate) fn fail(state: &AppState, error: &Error) -> FormOutcome {
    let message = error.to_string();
    tracing::warn!("{}", message);
    state.push_toast(ToastLevel::Error, message.clone());
    FormOutcome::failed(message)
}

/// The signed-in actor, or a toast telling the screen to sign in
pub(crate) fn require_actor(state: &AppState) -> Option<matinee_core::Actor> {
    match state.actor() {
        Some(actor) => Some(actor),
        None => {
            state.push_toast(ToastLevel::Error, "Staff sign-in required");
            None
        }
    }
}
