//! Matinee Core Library
//!
//! Domain models, pricing, permissions, the reservation desk, billing,
//! and storage for the Matinee dinner-show back office.

pub mod billing;
pub mod desk;
pub mod error;
pub mod invariants;
pub mod models;
pub mod permissions;
pub mod pricing;
pub mod promo;
pub mod storage;

pub use desk::{
    approve_overbooking, assess_capacity, book_from_waitlist, cancel_booking, move_to_waitlist,
    register_walk_in, reject_booking, reschedule_booking, submit_reservation, Actor,
    CapacityDecision, MerchandiseSelection, RescheduleOutcome, RescheduleRequest, SubmitOutcome,
    SubmitRequest, WaitlistBookingOutcome, WalkInRequest,
};
pub use error::{Error, Result};
pub use models::*;
pub use permissions::*;
pub use storage::{
    AuditStore, BookingRepository, BookingStore, CustomerStore, Database, InvoiceRepository,
    InvoiceStore, MerchandiseStore, OutboxStore, PackageStore, PromoCodeRepository,
    PromoCodeStore, SettingsStore, ShowRepository, ShowStore, StaffStore, WaitlistRepository,
    WaitlistStore,
};
