//! Settings singleton storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{parse_datetime, parse_uuid_opt, OptionalExt};
use crate::error::Result;
use crate::models::{AppSettings, SETTINGS_KEY};

pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

fn row_to_settings(row: &Row<'_>) -> rusqlite::Result<AppSettings> {
    Ok(AppSettings {
        company_name: row.get(0)?,
        company_address: row.get(1)?,
        company_email: row.get(2)?,
        vat_rate_bps: row.get(3)?,
        invoice_prefix: row.get(4)?,
        invoice_next_number: row.get(5)?,
        invoice_due_days: row.get(6)?,
        default_show_slot_id: parse_uuid_opt(row.get(7)?)?,
        default_package_id: parse_uuid_opt(row.get(8)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(9)?)?,
    })
}

impl<'a> SettingsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Load the settings row, falling back to defaults when none exists yet
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<AppSettings> {
        let mut stmt = self.conn.prepare(
            "SELECT company_name, company_address, company_email, vat_rate_bps, invoice_prefix,
                    invoice_next_number, invoice_due_days, default_show_slot_id, default_package_id,
                    updated_at
             FROM app_settings WHERE key = ?1",
        )?;

        let settings = stmt
            .query_row(params![SETTINGS_KEY], row_to_settings)
            .optional()?;

        Ok(settings.unwrap_or_default())
    }

    /// Write the full settings row (insert or replace)
    #[instrument(skip(self, settings))]
    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        self.conn.execute(
            "INSERT INTO app_settings (key, company_name, company_address, company_email,
                vat_rate_bps, invoice_prefix, invoice_next_number, invoice_due_days,
                default_show_slot_id, default_package_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(key) DO UPDATE SET
                company_name = excluded.company_name,
                company_address = excluded.company_address,
                company_email = excluded.company_email,
                vat_rate_bps = excluded.vat_rate_bps,
                invoice_prefix = excluded.invoice_prefix,
                invoice_next_number = excluded.invoice_next_number,
                invoice_due_days = excluded.invoice_due_days,
                default_show_slot_id = excluded.default_show_slot_id,
                default_package_id = excluded.default_package_id,
                updated_at = excluded.updated_at",
            params![
                SETTINGS_KEY,
                settings.company_name,
                settings.company_address,
                settings.company_email,
                settings.vat_rate_bps,
                settings.invoice_prefix,
                settings.invoice_next_number,
                settings.invoice_due_days,
                settings.default_show_slot_id.map(|id| id.to_string()),
                settings.default_package_id.map(|id| id.to_string()),
                settings.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Consume and return the next invoice sequence number
    #[instrument(skip(self))]
    pub fn next_invoice_number(&self) -> Result<u32> {
        let mut settings = self.load()?;
        let number = settings.invoice_next_number;
        settings.invoice_next_number += 1;
        settings.updated_at = chrono::Utc::now();
        self.save(&settings)?;
        Ok(number)
    }
}
