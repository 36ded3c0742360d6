//! Staff and shift rota storage operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    parse_date, parse_datetime, parse_datetime_opt, parse_time, parse_uuid, staff_role_from_u8,
    OptionalExt,
};
use crate::error::Result;
use crate::models::{ScheduledShift, StaffMember};

pub struct StaffStore<'a> {
    conn: &'a Connection,
}

const STAFF_COLUMNS: &str = "id, name, username, password_hash, role, is_active, created_at, last_login";

fn row_to_staff(row: &Row<'_>) -> rusqlite::Result<StaffMember> {
    Ok(StaffMember {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        role: staff_role_from_u8(row.get::<_, u8>(4)?),
        is_active: row.get::<_, i32>(5)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(6)?)?,
        last_login: parse_datetime_opt(row.get(7)?)?,
    })
}

fn row_to_shift(row: &Row<'_>) -> rusqlite::Result<ScheduledShift> {
    Ok(ScheduledShift {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        staff_id: parse_uuid(&row.get::<_, String>(1)?)?,
        date: parse_date(&row.get::<_, String>(2)?)?,
        starts: parse_time(&row.get::<_, String>(3)?)?,
        ends: parse_time(&row.get::<_, String>(4)?)?,
        duty: row.get(5)?,
        notes: row.get(6)?,
    })
}

impl<'a> StaffStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, staff), fields(username = %staff.username))]
    pub fn create(&self, staff: &StaffMember) -> Result<()> {
        self.conn.execute(
            "INSERT INTO staff (id, name, username, password_hash, role, is_active, created_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                staff.id.to_string(),
                staff.name,
                staff.username,
                staff.password_hash,
                staff.role as u8,
                staff.is_active as i32,
                staff.created_at.to_rfc3339(),
                staff.last_login.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<StaffMember>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM staff WHERE id = ?1", STAFF_COLUMNS))?;

        let staff = stmt
            .query_row(params![id.to_string()], row_to_staff)
            .optional()?;

        Ok(staff)
    }

    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<StaffMember>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM staff WHERE username = ?1", STAFF_COLUMNS))?;

        let staff = stmt.query_row(params![username], row_to_staff).optional()?;

        Ok(staff)
    }

    #[instrument(skip(self))]
    pub fn update_last_login(&self, staff_id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE staff SET last_login = ?1 WHERE id = ?2",
            params![chrono::Utc::now().to_rfc3339(), staff_id.to_string()],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn set_active(&self, staff_id: Uuid, is_active: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE staff SET is_active = ?1 WHERE id = ?2",
            params![is_active as i32, staff_id.to_string()],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<StaffMember>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM staff ORDER BY role DESC, name",
            STAFF_COLUMNS
        ))?;

        let staff = stmt
            .query_map([], row_to_staff)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(staff)
    }

    // Shift rota

    #[instrument(skip(self, shift), fields(staff_id = %shift.staff_id, date = %shift.date))]
    pub fn create_shift(&self, shift: &ScheduledShift) -> Result<()> {
        self.conn.execute(
            "INSERT INTO scheduled_shifts (id, staff_id, date, starts, ends, duty, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                shift.id.to_string(),
                shift.staff_id.to_string(),
                shift.date.format("%Y-%m-%d").to_string(),
                shift.starts.format("%H:%M").to_string(),
                shift.ends.format("%H:%M").to_string(),
                shift.duty,
                shift.notes,
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_shift(&self, shift_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM scheduled_shifts WHERE id = ?1",
            params![shift_id.to_string()],
        )?;
        Ok(())
    }

    /// Shifts within an inclusive date range, chronological
    #[instrument(skip(self))]
    pub fn list_shifts_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ScheduledShift>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, staff_id, date, starts, ends, duty, notes
             FROM scheduled_shifts
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date, starts",
        )?;

        let shifts = stmt
            .query_map(
                params![
                    from.format("%Y-%m-%d").to_string(),
                    to.format("%Y-%m-%d").to_string()
                ],
                row_to_shift,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(shifts)
    }
}
