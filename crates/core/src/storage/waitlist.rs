//! Waiting list storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, waitlist_status_from_str, OptionalExt};
use crate::error::Result;
use crate::models::{WaitingListEntry, WaitlistStatus};

pub struct WaitlistStore<'a> {
    conn: &'a Connection,
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<WaitingListEntry> {
    Ok(WaitingListEntry {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        show_slot_id: parse_uuid(&row.get::<_, String>(1)?)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        guests: row.get(5)?,
        status: waitlist_status_from_str(&row.get::<_, String>(6)?),
        notes: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

const ENTRY_COLUMNS: &str = "id, show_slot_id, name, email, phone, guests, status, notes, created_at";

impl<'a> WaitlistStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    pub fn create(&self, entry: &WaitingListEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO waiting_list (id, show_slot_id, name, email, phone, guests, status, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id.to_string(),
                entry.show_slot_id.to_string(),
                entry.name,
                entry.email,
                entry.phone,
                entry.guests,
                entry.status.as_str(),
                entry.notes,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<WaitingListEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM waiting_list WHERE id = ?1",
            ENTRY_COLUMNS
        ))?;

        let entry = stmt
            .query_row(params![id.to_string()], row_to_entry)
            .optional()?;

        Ok(entry)
    }

    #[instrument(skip(self))]
    pub fn set_status(&self, id: Uuid, status: WaitlistStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE waiting_list SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id.to_string()],
        )?;
        Ok(())
    }

    /// Open entries for a slot, oldest first (fairness order)
    #[instrument(skip(self))]
    pub fn list_open_for_slot(&self, show_slot_id: Uuid) -> Result<Vec<WaitingListEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM waiting_list
             WHERE show_slot_id = ?1 AND status IN ('pending', 'contacted')
             ORDER BY created_at",
            ENTRY_COLUMNS
        ))?;

        let entries = stmt
            .query_map(params![show_slot_id.to_string()], row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// All entries for a slot regardless of status
    #[instrument(skip(self))]
    pub fn list_for_slot(&self, show_slot_id: Uuid) -> Result<Vec<WaitingListEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM waiting_list WHERE show_slot_id = ?1 ORDER BY created_at",
            ENTRY_COLUMNS
        ))?;

        let entries = stmt
            .query_map(params![show_slot_id.to_string()], row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
