//! Promo code storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_datetime_opt, parse_uuid, promo_kind_from_str, OptionalExt};
use crate::error::Result;
use crate::models::PromoCode;

pub struct PromoCodeStore<'a> {
    conn: &'a Connection,
}

fn row_to_promo(row: &Row<'_>) -> rusqlite::Result<PromoCode> {
    Ok(PromoCode {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        code: row.get(1)?,
        kind: promo_kind_from_str(&row.get::<_, String>(2)?),
        value: row.get(3)?,
        usage_limit: row.get(4)?,
        times_used: row.get(5)?,
        min_booking_cents: row.get(6)?,
        expires_at: parse_datetime_opt(row.get(7)?)?,
        is_active: row.get::<_, i32>(8)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(9)?)?,
    })
}

const PROMO_COLUMNS: &str =
    "id, code, kind, value, usage_limit, times_used, min_booking_cents, expires_at, is_active, created_at";

impl<'a> PromoCodeStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, promo), fields(code = %promo.code))]
    pub fn create(&self, promo: &PromoCode) -> Result<()> {
        self.conn.execute(
            "INSERT INTO promo_codes (id, code, kind, value, usage_limit, times_used, min_booking_cents, expires_at, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                promo.id.to_string(),
                promo.code,
                promo.kind.as_str(),
                promo.value,
                promo.usage_limit,
                promo.times_used,
                promo.min_booking_cents,
                promo.expires_at.map(|t| t.to_rfc3339()),
                promo.is_active as i32,
                promo.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Case-insensitive code lookup
    #[instrument(skip(self))]
    pub fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM promo_codes WHERE code = ?1",
            PROMO_COLUMNS
        ))?;

        let promo = stmt
            .query_row(params![code.to_uppercase()], row_to_promo)
            .optional()?;

        Ok(promo)
    }

    #[instrument(skip(self, promo), fields(code = %promo.code))]
    pub fn update(&self, promo: &PromoCode) -> Result<()> {
        self.conn.execute(
            "UPDATE promo_codes SET kind = ?1, value = ?2, usage_limit = ?3,
                    min_booking_cents = ?4, expires_at = ?5, is_active = ?6
             WHERE id = ?7",
            params![
                promo.kind.as_str(),
                promo.value,
                promo.usage_limit,
                promo.min_booking_cents,
                promo.expires_at.map(|t| t.to_rfc3339()),
                promo.is_active as i32,
                promo.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Record one redemption
    #[instrument(skip(self))]
    pub fn increment_times_used(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE promo_codes SET times_used = times_used + 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<PromoCode>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM promo_codes ORDER BY code", PROMO_COLUMNS))?;

        let promos = stmt
            .query_map([], row_to_promo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(promos)
    }
}
