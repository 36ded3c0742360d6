//! Customer storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::Customer;

pub struct CustomerStore<'a> {
    conn: &'a Connection,
}

fn row_to_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        notes: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> CustomerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, customer), fields(email = %customer.email))]
    pub fn create(&self, customer: &Customer) -> Result<()> {
        self.conn.execute(
            "INSERT INTO customers (id, name, email, phone, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                customer.id.to_string(),
                customer.name,
                customer.email,
                customer.phone,
                customer.notes,
                customer.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, phone, notes, created_at FROM customers WHERE email = ?1",
        )?;

        let customer = stmt.query_row(params![email], row_to_customer).optional()?;

        Ok(customer)
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, phone, notes, created_at FROM customers WHERE id = ?1",
        )?;

        let customer = stmt
            .query_row(params![id.to_string()], row_to_customer)
            .optional()?;

        Ok(customer)
    }

    /// Insert the contact, or refresh name/phone on an existing email.
    /// Returns the stored customer.
    #[instrument(skip(self, customer), fields(email = %customer.email))]
    pub fn upsert_by_email(&self, customer: &Customer) -> Result<Customer> {
        if let Some(existing) = self.find_by_email(&customer.email)? {
            self.conn.execute(
                "UPDATE customers SET name = ?1, phone = COALESCE(?2, phone) WHERE id = ?3",
                params![customer.name, customer.phone, existing.id.to_string()],
            )?;
            return Ok(Customer {
                name: customer.name.clone(),
                phone: customer.phone.clone().or(existing.phone.clone()),
                ..existing
            });
        }
        self.create(customer)?;
        Ok(customer.clone())
    }

    /// All customers, alphabetical
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, phone, notes, created_at FROM customers ORDER BY name",
        )?;

        let customers = stmt
            .query_map([], row_to_customer)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(customers)
    }
}
