//! Reservation desk - booking lifecycle orchestration
//!
//! Every operation here coordinates a booking's status with its show
//! slot's `booked_count`. The two must move together, so each operation
//! runs in a single transaction, re-reads authoritative rows inside it,
//! and appends an audit entry before committing. Concurrent handlers are
//! serialized by the store; there is no code path that updates a counter
//! from caller-supplied state.

mod capacity;
mod lifecycle;
mod reschedule;
mod submit;
mod waitlist;

pub use capacity::{assess_capacity, CapacityDecision};
pub use lifecycle::{approve_overbooking, cancel_booking, move_to_waitlist, reject_booking};
pub use reschedule::{reschedule_booking, RescheduleOutcome, RescheduleRequest};
pub use submit::{
    submit_reservation, MerchandiseSelection, SubmitOutcome, SubmitRequest,
};
pub use waitlist::{
    book_from_waitlist, register_walk_in, WaitlistBookingOutcome, WalkInRequest,
};

use rusqlite::Transaction;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AuditLogEntry, Booking, ShowSlot, StaffRole, CUSTOMER_ACTOR};
use crate::permissions::{DeskAction, PermissionMatrix};
use crate::storage::{AuditStore, BookingStore, ShowStore};

/// Who is driving a desk operation
#[derive(Debug, Clone, Copy)]
pub enum Actor {
    /// A guest acting through the public booking form
    Customer,
    /// A signed-in staff member
    Staff { id: Uuid, role: StaffRole },
}

impl Actor {
    pub fn audit_name(&self) -> String {
        match self {
            Actor::Customer => CUSTOMER_ACTOR.to_string(),
            Actor::Staff { id, .. } => id.to_string(),
        }
    }

    /// Enforce the permission matrix for staff-only operations
    pub fn require(&self, action: DeskAction) -> Result<()> {
        match self {
            Actor::Customer => Err(Error::PermissionDenied(
                "Staff sign-in required".to_string(),
            )),
            Actor::Staff { role, .. } => {
                if PermissionMatrix::can_perform(*role, action) {
                    Ok(())
                } else {
                    Err(Error::PermissionDenied(format!(
                        "Role {} may not perform this action",
                        role.display_name()
                    )))
                }
            }
        }
    }
}

/// Load a booking inside a transaction or fail with NotFound
fn load_booking(tx: &Transaction<'_>, booking_id: Uuid) -> Result<Booking> {
    BookingStore::new(tx)
        .find_by_id(booking_id)?
        .ok_or_else(|| Error::NotFound(format!("Booking {}", booking_id)))
}

/// Load a show slot inside a transaction or fail with NotFound
fn load_slot(tx: &Transaction<'_>, show_slot_id: Uuid) -> Result<ShowSlot> {
    ShowStore::new(tx)
        .find_by_id(show_slot_id)?
        .ok_or_else(|| Error::NotFound(format!("Show slot {}", show_slot_id)))
}

/// Append an audit entry in the operation's transaction
fn audit(
    tx: &Transaction<'_>,
    actor: &Actor,
    action: &str,
    subject_id: Uuid,
    detail: String,
) -> Result<()> {
    AuditStore::new(tx).append(&AuditLogEntry::new(
        actor.audit_name(),
        action,
        Some(subject_id),
        detail,
    ))
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    use crate::models::{PackageOption, ShowSlot, StaffRole};
    use crate::storage::Database;

    use super::Actor;

    pub fn manager() -> Actor {
        Actor::Staff {
            id: Uuid::new_v4(),
            role: StaffRole::Manager,
        }
    }

    pub fn box_office() -> Actor {
        Actor::Staff {
            id: Uuid::new_v4(),
            role: StaffRole::BoxOffice,
        }
    }

    /// A database with one slot (capacity 10, 8 already booked) and one
    /// flat-priced package, mirroring the worked capacity examples.
    pub fn seeded_db() -> (Database, ShowSlot, PackageOption) {
        let db = Database::open_in_memory().unwrap();

        let mut slot = ShowSlot::new(
            NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            10,
        );
        slot.booked_count = 8;
        db.shows().create(&slot).unwrap();

        let package = PackageOption::new("Dinner & Show".into()).with_flat_price(8900);
        db.packages().create(&package).unwrap();

        (db, slot, package)
    }

    pub fn empty_slot(db: &Database, capacity: u32) -> ShowSlot {
        let slot = ShowSlot::new(
            NaiveDate::from_ymd_opt(2026, 9, 19).unwrap(),
            NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            capacity,
        );
        db.shows().create(&slot).unwrap();
        slot
    }
}
