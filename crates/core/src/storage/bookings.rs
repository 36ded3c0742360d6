//! Booking storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    booking_status_from_str, cancel_actor_from_str, parse_datetime, parse_datetime_opt, parse_json,
    parse_uuid, OptionalExt,
};
use crate::error::Result;
use crate::models::{Booking, BookingStatus};

pub struct BookingStore<'a> {
    conn: &'a Connection,
}

const BOOKING_COLUMNS: &str = "id, reservation_code, show_slot_id, package_id, package_name, guests, \
     customer_name, customer_email, customer_phone, billing_address, status, is_overbooking, \
     holds_capacity, total_price_cents, applied_promo_code, discount_cents, add_on_ids, \
     merchandise, reschedule_history, cancellation_reason, cancelled_by, cancelled_at, \
     admin_notes, created_at, idempotency_key";

fn row_to_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        reservation_code: row.get(1)?,
        show_slot_id: parse_uuid(&row.get::<_, String>(2)?)?,
        package_id: parse_uuid(&row.get::<_, String>(3)?)?,
        package_name: row.get(4)?,
        guests: row.get(5)?,
        customer_name: row.get(6)?,
        customer_email: row.get(7)?,
        customer_phone: row.get(8)?,
        billing_address: row.get(9)?,
        status: booking_status_from_str(&row.get::<_, String>(10)?),
        is_overbooking: row.get::<_, i32>(11)? != 0,
        holds_capacity: row.get::<_, i32>(12)? != 0,
        total_price_cents: row.get(13)?,
        applied_promo_code: row.get(14)?,
        discount_cents: row.get(15)?,
        add_on_ids: parse_json(&row.get::<_, String>(16)?)?,
        merchandise: parse_json(&row.get::<_, String>(17)?)?,
        reschedule_history: parse_json(&row.get::<_, String>(18)?)?,
        cancellation_reason: row.get(19)?,
        cancelled_by: cancel_actor_from_str(row.get(20)?),
        cancelled_at: parse_datetime_opt(row.get(21)?)?,
        admin_notes: row.get(22)?,
        created_at: parse_datetime(&row.get::<_, String>(23)?)?,
        idempotency_key: row.get(24)?,
    })
}

impl<'a> BookingStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new booking
    #[instrument(skip(self, booking), fields(code = %booking.reservation_code))]
    pub fn create(&self, booking: &Booking) -> Result<()> {
        self.conn.execute(
            "INSERT INTO bookings (id, reservation_code, show_slot_id, package_id, package_name, guests,
                customer_name, customer_email, customer_phone, billing_address, status, is_overbooking,
                holds_capacity, total_price_cents, applied_promo_code, discount_cents, add_on_ids,
                merchandise, reschedule_history, cancellation_reason, cancelled_by, cancelled_at,
                admin_notes, created_at, idempotency_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
            params![
                booking.id.to_string(),
                booking.reservation_code,
                booking.show_slot_id.to_string(),
                booking.package_id.to_string(),
                booking.package_name,
                booking.guests,
                booking.customer_name,
                booking.customer_email,
                booking.customer_phone,
                booking.billing_address,
                booking.status.as_str(),
                booking.is_overbooking as i32,
                booking.holds_capacity as i32,
                booking.total_price_cents,
                booking.applied_promo_code,
                booking.discount_cents,
                serde_json::to_string(&booking.add_on_ids)?,
                serde_json::to_string(&booking.merchandise)?,
                serde_json::to_string(&booking.reschedule_history)?,
                booking.cancellation_reason,
                booking.cancelled_by.map(|a| a.as_str()),
                booking.cancelled_at.map(|t| t.to_rfc3339()),
                booking.admin_notes,
                booking.created_at.to_rfc3339(),
                booking.idempotency_key,
            ],
        )?;
        Ok(())
    }

    /// Write back every mutable field of a booking
    #[instrument(skip(self, booking), fields(code = %booking.reservation_code))]
    pub fn update(&self, booking: &Booking) -> Result<()> {
        self.conn.execute(
            "UPDATE bookings SET show_slot_id = ?1, package_id = ?2, package_name = ?3, guests = ?4,
                customer_name = ?5, customer_email = ?6, customer_phone = ?7, billing_address = ?8,
                status = ?9, is_overbooking = ?10, holds_capacity = ?11, total_price_cents = ?12,
                applied_promo_code = ?13, discount_cents = ?14, add_on_ids = ?15, merchandise = ?16,
                reschedule_history = ?17, cancellation_reason = ?18, cancelled_by = ?19,
                cancelled_at = ?20, admin_notes = ?21
             WHERE id = ?22",
            params![
                booking.show_slot_id.to_string(),
                booking.package_id.to_string(),
                booking.package_name,
                booking.guests,
                booking.customer_name,
                booking.customer_email,
                booking.customer_phone,
                booking.billing_address,
                booking.status.as_str(),
                booking.is_overbooking as i32,
                booking.holds_capacity as i32,
                booking.total_price_cents,
                booking.applied_promo_code,
                booking.discount_cents,
                serde_json::to_string(&booking.add_on_ids)?,
                serde_json::to_string(&booking.merchandise)?,
                serde_json::to_string(&booking.reschedule_history)?,
                booking.cancellation_reason,
                booking.cancelled_by.map(|a| a.as_str()),
                booking.cancelled_at.map(|t| t.to_rfc3339()),
                booking.admin_notes,
                booking.id.to_string(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM bookings WHERE id = ?1", BOOKING_COLUMNS))?;

        let booking = stmt
            .query_row(params![id.to_string()], row_to_booking)
            .optional()?;

        Ok(booking)
    }

    #[instrument(skip(self))]
    pub fn find_by_code(&self, reservation_code: &str) -> Result<Option<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookings WHERE reservation_code = ?1",
            BOOKING_COLUMNS
        ))?;

        let booking = stmt
            .query_row(params![reservation_code], row_to_booking)
            .optional()?;

        Ok(booking)
    }

    /// Look up a previous submission by its idempotency key
    #[instrument(skip(self))]
    pub fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookings WHERE idempotency_key = ?1",
            BOOKING_COLUMNS
        ))?;

        let booking = stmt.query_row(params![key], row_to_booking).optional()?;

        Ok(booking)
    }

    /// All bookings for a slot, newest first
    #[instrument(skip(self))]
    pub fn list_for_slot(&self, show_slot_id: Uuid) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookings WHERE show_slot_id = ?1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))?;

        let bookings = stmt
            .query_map(params![show_slot_id.to_string()], row_to_booking)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// All bookings in a status, newest first
    #[instrument(skip(self))]
    pub fn list_by_status(&self, status: BookingStatus) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookings WHERE status = ?1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))?;

        let bookings = stmt
            .query_map(params![status.as_str()], row_to_booking)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Bookings created within a half-open time range
    #[instrument(skip(self))]
    pub fn list_created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookings WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at",
            BOOKING_COLUMNS
        ))?;

        let bookings = stmt
            .query_map(params![from.to_rfc3339(), to.to_rfc3339()], row_to_booking)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Count bookings that currently hold capacity in a slot
    #[instrument(skip(self))]
    pub fn count_holding_capacity(&self, show_slot_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE show_slot_id = ?1 AND holds_capacity = 1",
            params![show_slot_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
