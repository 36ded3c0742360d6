//! Audit log storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, parse_uuid, parse_uuid_opt};
use crate::error::Result;
use crate::models::AuditLogEntry;

pub struct AuditStore<'a> {
    conn: &'a Connection,
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<AuditLogEntry> {
    Ok(AuditLogEntry {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        actor: row.get(1)?,
        action: row.get(2)?,
        subject_id: parse_uuid_opt(row.get(3)?)?,
        detail: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> AuditStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, entry), fields(action = %entry.action))]
    pub fn append(&self, entry: &AuditLogEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO audit_log (id, actor, action, subject_id, detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id.to_string(),
                entry.actor,
                entry.action,
                entry.subject_id.map(|id| id.to_string()),
                entry.detail,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent entries, newest first
    #[instrument(skip(self))]
    pub fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor, action, subject_id, detail, created_at
             FROM audit_log ORDER BY created_at DESC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map(params![limit], row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
