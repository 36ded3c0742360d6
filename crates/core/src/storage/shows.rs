//! Show slot storage operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_date, parse_datetime, parse_json, parse_time, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::ShowSlot;

pub struct ShowStore<'a> {
    conn: &'a Connection,
}

fn row_to_slot(row: &Row<'_>) -> rusqlite::Result<ShowSlot> {
    Ok(ShowSlot {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        date: parse_date(&row.get::<_, String>(1)?)?,
        time: parse_time(&row.get::<_, String>(2)?)?,
        capacity: row.get(3)?,
        booked_count: row.get(4)?,
        is_manually_closed: row.get::<_, i32>(5)? != 0,
        available_package_ids: parse_json(&row.get::<_, String>(6)?)?,
        price_tier: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

const SLOT_COLUMNS: &str =
    "id, date, time, capacity, booked_count, is_manually_closed, available_package_ids, price_tier, created_at";

impl<'a> ShowStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new show slot
    #[instrument(skip(self, slot), fields(slot_id = %slot.id, date = %slot.date))]
    pub fn create(&self, slot: &ShowSlot) -> Result<()> {
        self.conn.execute(
            "INSERT INTO shows (id, date, time, capacity, booked_count, is_manually_closed, available_package_ids, price_tier, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                slot.id.to_string(),
                slot.date.format("%Y-%m-%d").to_string(),
                slot.time.format("%H:%M").to_string(),
                slot.capacity,
                slot.booked_count,
                slot.is_manually_closed as i32,
                serde_json::to_string(&slot.available_package_ids)?,
                slot.price_tier,
                slot.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find slot by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<ShowSlot>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM shows WHERE id = ?1", SLOT_COLUMNS))?;

        let slot = stmt
            .query_row(params![id.to_string()], row_to_slot)
            .optional()?;

        Ok(slot)
    }

    /// Update slot fields except the booked counter
    #[instrument(skip(self, slot), fields(slot_id = %slot.id))]
    pub fn update(&self, slot: &ShowSlot) -> Result<()> {
        self.conn.execute(
            "UPDATE shows SET date = ?1, time = ?2, capacity = ?3, is_manually_closed = ?4,
                    available_package_ids = ?5, price_tier = ?6
             WHERE id = ?7",
            params![
                slot.date.format("%Y-%m-%d").to_string(),
                slot.time.format("%H:%M").to_string(),
                slot.capacity,
                slot.is_manually_closed as i32,
                serde_json::to_string(&slot.available_package_ids)?,
                slot.price_tier,
                slot.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Add guests to the booked counter
    #[instrument(skip(self))]
    pub fn add_booked(&self, slot_id: Uuid, guests: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE shows SET booked_count = booked_count + ?1 WHERE id = ?2",
            params![guests, slot_id.to_string()],
        )?;
        Ok(())
    }

    /// Release guests from the booked counter, floored at zero
    #[instrument(skip(self))]
    pub fn release_booked(&self, slot_id: Uuid, guests: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE shows SET booked_count = MAX(0, booked_count - ?1) WHERE id = ?2",
            params![guests, slot_id.to_string()],
        )?;
        Ok(())
    }

    /// Open or close a slot for direct booking
    #[instrument(skip(self))]
    pub fn set_manually_closed(&self, slot_id: Uuid, closed: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE shows SET is_manually_closed = ?1 WHERE id = ?2",
            params![closed as i32, slot_id.to_string()],
        )?;
        Ok(())
    }

    /// Delete a slot
    #[instrument(skip(self))]
    pub fn delete(&self, slot_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM shows WHERE id = ?1",
            params![slot_id.to_string()],
        )?;
        Ok(())
    }

    /// List slots on or after a date, soonest first
    #[instrument(skip(self))]
    pub fn list_from(&self, from: NaiveDate) -> Result<Vec<ShowSlot>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM shows WHERE date >= ?1 ORDER BY date, time",
            SLOT_COLUMNS
        ))?;

        let slots = stmt
            .query_map(params![from.format("%Y-%m-%d").to_string()], row_to_slot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(slots)
    }

    /// List slots within an inclusive date range
    #[instrument(skip(self))]
    pub fn list_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ShowSlot>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM shows WHERE date >= ?1 AND date <= ?2 ORDER BY date, time",
            SLOT_COLUMNS
        ))?;

        let slots = stmt
            .query_map(
                params![
                    from.format("%Y-%m-%d").to_string(),
                    to.format("%Y-%m-%d").to_string()
                ],
                row_to_slot,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(slots)
    }
}
