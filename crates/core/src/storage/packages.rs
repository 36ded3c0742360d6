//! Package storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_json, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::PackageOption;

pub struct PackageStore<'a> {
    conn: &'a Connection,
}

fn row_to_package(row: &Row<'_>) -> rusqlite::Result<PackageOption> {
    Ok(PackageOption {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_cents: row.get(3)?,
        price_levels: parse_json(&row.get::<_, String>(4)?)?,
        add_ons: parse_json(&row.get::<_, String>(5)?)?,
        is_active: row.get::<_, i32>(6)? != 0,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
    })
}

const PACKAGE_COLUMNS: &str =
    "id, name, description, price_cents, price_levels, add_ons, is_active, created_at";

impl<'a> PackageStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, package), fields(name = %package.name))]
    pub fn create(&self, package: &PackageOption) -> Result<()> {
        self.conn.execute(
            "INSERT INTO packages (id, name, description, price_cents, price_levels, add_ons, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                package.id.to_string(),
                package.name,
                package.description,
                package.price_cents,
                serde_json::to_string(&package.price_levels)?,
                serde_json::to_string(&package.add_ons)?,
                package.is_active as i32,
                package.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<PackageOption>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM packages WHERE id = ?1", PACKAGE_COLUMNS))?;

        let package = stmt
            .query_row(params![id.to_string()], row_to_package)
            .optional()?;

        Ok(package)
    }

    #[instrument(skip(self, package), fields(package_id = %package.id))]
    pub fn update(&self, package: &PackageOption) -> Result<()> {
        self.conn.execute(
            "UPDATE packages SET name = ?1, description = ?2, price_cents = ?3,
                    price_levels = ?4, add_ons = ?5, is_active = ?6
             WHERE id = ?7",
            params![
                package.name,
                package.description,
                package.price_cents,
                serde_json::to_string(&package.price_levels)?,
                serde_json::to_string(&package.add_ons)?,
                package.is_active as i32,
                package.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// List active packages, alphabetical
    #[instrument(skip(self))]
    pub fn list_active(&self) -> Result<Vec<PackageOption>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM packages WHERE is_active = 1 ORDER BY name",
            PACKAGE_COLUMNS
        ))?;

        let packages = stmt
            .query_map([], row_to_package)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }
}
