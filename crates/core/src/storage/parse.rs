//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Error as SqlError;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::models::{
    BookingStatus, CancelActor, InvoiceStatus, NotificationKind, NotificationStatus, PromoKind,
    StaffRole, WaitlistStatus,
};

fn conversion_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> SqlError {
    SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

/// Parse a UUID from a database string column
pub fn parse_uuid(s: &str) -> Result<Uuid, SqlError> {
    Uuid::parse_str(s).map_err(conversion_err)
}

/// Parse an optional UUID from a database string column
pub fn parse_uuid_opt(s: Option<String>) -> Result<Option<Uuid>, SqlError> {
    s.map(|s| parse_uuid(&s)).transpose()
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_err)
}

/// Parse an optional DateTime from an RFC3339 string
pub fn parse_datetime_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, SqlError> {
    s.map(|s| parse_datetime(&s)).transpose()
}

/// Parse a calendar date stored as `YYYY-MM-DD`
pub fn parse_date(s: &str) -> Result<NaiveDate, SqlError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(conversion_err)
}

/// Parse a time of day stored as `HH:MM`
pub fn parse_time(s: &str) -> Result<NaiveTime, SqlError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(conversion_err)
}

/// Parse a JSON-encoded column
pub fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, SqlError> {
    serde_json::from_str(s).map_err(conversion_err)
}

/// Convert a status string to BookingStatus, defaulting unknown values
/// to `PendingApproval` so a corrupted row surfaces in the approval queue
/// rather than vanishing
pub fn booking_status_from_str(s: &str) -> BookingStatus {
    match s {
        "confirmed" => BookingStatus::Confirmed,
        "rejected" => BookingStatus::Rejected,
        "cancelled" => BookingStatus::Cancelled,
        "moved_to_waitlist" => BookingStatus::MovedToWaitlist,
        _ => BookingStatus::PendingApproval,
    }
}

pub fn waitlist_status_from_str(s: &str) -> WaitlistStatus {
    match s {
        "contacted" => WaitlistStatus::Contacted,
        "booked" => WaitlistStatus::Booked,
        "expired" => WaitlistStatus::Expired,
        _ => WaitlistStatus::Pending,
    }
}

pub fn promo_kind_from_str(s: &str) -> PromoKind {
    match s {
        "fixed_amount" => PromoKind::FixedAmount,
        "gift_card" => PromoKind::GiftCard,
        _ => PromoKind::Percentage,
    }
}

pub fn invoice_status_from_str(s: &str) -> InvoiceStatus {
    match s {
        "sent" => InvoiceStatus::Sent,
        "paid" => InvoiceStatus::Paid,
        "overdue" => InvoiceStatus::Overdue,
        "credited" => InvoiceStatus::Credited,
        _ => InvoiceStatus::Draft,
    }
}

pub fn cancel_actor_from_str(s: Option<String>) -> Option<CancelActor> {
    match s.as_deref() {
        Some("user") => Some(CancelActor::User),
        Some("admin") => Some(CancelActor::Admin),
        _ => None,
    }
}

pub fn notification_kind_from_str(s: &str) -> NotificationKind {
    match s {
        "admin_alert" => NotificationKind::AdminAlert,
        _ => NotificationKind::CustomerConfirmation,
    }
}

pub fn notification_status_from_str(s: &str) -> NotificationStatus {
    match s {
        "sent" => NotificationStatus::Sent,
        "failed" => NotificationStatus::Failed,
        _ => NotificationStatus::Pending,
    }
}

/// Convert a u8 to StaffRole
pub fn staff_role_from_u8(value: u8) -> StaffRole {
    match value {
        4 => StaffRole::Owner,
        3 => StaffRole::Manager,
        2 => StaffRole::BoxOffice,
        _ => StaffRole::Usher,
    }
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
