//! Merchandise catalog storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::MerchandiseItem;

pub struct MerchandiseStore<'a> {
    conn: &'a Connection,
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<MerchandiseItem> {
    Ok(MerchandiseItem {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        unit_price_cents: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(4)?)?,
    })
}

impl<'a> MerchandiseStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, item), fields(name = %item.name))]
    pub fn create(&self, item: &MerchandiseItem) -> Result<()> {
        self.conn.execute(
            "INSERT INTO merchandise (id, name, unit_price_cents, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.id.to_string(),
                item.name,
                item.unit_price_cents,
                item.is_active as i32,
                item.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<MerchandiseItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, unit_price_cents, is_active, created_at FROM merchandise WHERE id = ?1",
        )?;

        let item = stmt
            .query_row(params![id.to_string()], row_to_item)
            .optional()?;

        Ok(item)
    }

    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub fn update(&self, item: &MerchandiseItem) -> Result<()> {
        self.conn.execute(
            "UPDATE merchandise SET name = ?1, unit_price_cents = ?2, is_active = ?3 WHERE id = ?4",
            params![
                item.name,
                item.unit_price_cents,
                item.is_active as i32,
                item.id.to_string(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn list_active(&self) -> Result<Vec<MerchandiseItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, unit_price_cents, is_active, created_at
             FROM merchandise WHERE is_active = 1 ORDER BY name",
        )?;

        let items = stmt
            .query_map([], row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }
}
