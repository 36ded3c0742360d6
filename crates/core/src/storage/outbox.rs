//! Notification outbox storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    notification_kind_from_str, notification_status_from_str, parse_datetime, parse_uuid,
};
use crate::error::Result;
use crate::models::{NotificationStatus, OutboxEntry};

pub struct OutboxStore<'a> {
    conn: &'a Connection,
}

const OUTBOX_COLUMNS: &str =
    "id, kind, booking_id, recipient, subject, body, status, attempts, next_attempt_at, last_error, created_at";

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<OutboxEntry> {
    Ok(OutboxEntry {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        kind: notification_kind_from_str(&row.get::<_, String>(1)?),
        booking_id: parse_uuid(&row.get::<_, String>(2)?)?,
        recipient: row.get(3)?,
        subject: row.get(4)?,
        body: row.get(5)?,
        status: notification_status_from_str(&row.get::<_, String>(6)?),
        attempts: row.get(7)?,
        next_attempt_at: parse_datetime(&row.get::<_, String>(8)?)?,
        last_error: row.get(9)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?)?,
    })
}

impl<'a> OutboxStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, entry), fields(kind = %entry.kind.as_str(), recipient = %entry.recipient))]
    pub fn enqueue(&self, entry: &OutboxEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notification_outbox (id, kind, booking_id, recipient, subject, body,
                status, attempts, next_attempt_at, last_error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.id.to_string(),
                entry.kind.as_str(),
                entry.booking_id.to_string(),
                entry.recipient,
                entry.subject,
                entry.body,
                entry.status.as_str(),
                entry.attempts,
                entry.next_attempt_at.to_rfc3339(),
                entry.last_error,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Pending entries whose next attempt is due, oldest first
    #[instrument(skip(self))]
    pub fn list_due(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<OutboxEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM notification_outbox
             WHERE status = 'pending' AND next_attempt_at <= ?1
             ORDER BY created_at LIMIT ?2",
            OUTBOX_COLUMNS
        ))?;

        let entries = stmt
            .query_map(params![now.to_rfc3339(), limit], row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    #[instrument(skip(self))]
    pub fn mark_sent(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE notification_outbox SET status = 'sent', last_error = NULL WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// Record a failed attempt and schedule the next one, or give up
    #[instrument(skip(self, error))]
    pub fn record_failure(
        &self,
        id: Uuid,
        error: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let status = if next_attempt_at.is_some() {
            NotificationStatus::Pending
        } else {
            NotificationStatus::Failed
        };
        self.conn.execute(
            "UPDATE notification_outbox SET attempts = attempts + 1, last_error = ?1,
                    status = ?2, next_attempt_at = COALESCE(?3, next_attempt_at)
             WHERE id = ?4",
            params![
                error,
                status.as_str(),
                next_attempt_at.map(|t| t.to_rfc3339()),
                id.to_string(),
            ],
        )?;
        Ok(())
    }
}
