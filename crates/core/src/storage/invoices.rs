//! Invoice storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    invoice_status_from_str, parse_datetime, parse_datetime_opt, parse_json, parse_uuid,
    parse_uuid_opt, OptionalExt,
};
use crate::error::Result;
use crate::models::{Invoice, InvoiceStatus};

pub struct InvoiceStore<'a> {
    conn: &'a Connection,
}

const INVOICE_COLUMNS: &str = "id, invoice_number, booking_id, customer_name, billing_address, lines, \
     net_cents, vat_cents, gross_cents, vat_rate_bps, status, credit_of, issued_at, due_at, sent_at, paid_at";

fn row_to_invoice(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        invoice_number: row.get(1)?,
        booking_id: parse_uuid(&row.get::<_, String>(2)?)?,
        customer_name: row.get(3)?,
        billing_address: row.get(4)?,
        lines: parse_json(&row.get::<_, String>(5)?)?,
        net_cents: row.get(6)?,
        vat_cents: row.get(7)?,
        gross_cents: row.get(8)?,
        vat_rate_bps: row.get(9)?,
        status: invoice_status_from_str(&row.get::<_, String>(10)?),
        credit_of: parse_uuid_opt(row.get(11)?)?,
        issued_at: parse_datetime(&row.get::<_, String>(12)?)?,
        due_at: parse_datetime(&row.get::<_, String>(13)?)?,
        sent_at: parse_datetime_opt(row.get(14)?)?,
        paid_at: parse_datetime_opt(row.get(15)?)?,
    })
}

impl<'a> InvoiceStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, invoice), fields(number = %invoice.invoice_number))]
    pub fn create(&self, invoice: &Invoice) -> Result<()> {
        self.conn.execute(
            "INSERT INTO invoices (id, invoice_number, booking_id, customer_name, billing_address,
                lines, net_cents, vat_cents, gross_cents, vat_rate_bps, status, credit_of,
                issued_at, due_at, sent_at, paid_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                invoice.id.to_string(),
                invoice.invoice_number,
                invoice.booking_id.to_string(),
                invoice.customer_name,
                invoice.billing_address,
                serde_json::to_string(&invoice.lines)?,
                invoice.net_cents,
                invoice.vat_cents,
                invoice.gross_cents,
                invoice.vat_rate_bps,
                invoice.status.as_str(),
                invoice.credit_of.map(|id| id.to_string()),
                invoice.issued_at.to_rfc3339(),
                invoice.due_at.to_rfc3339(),
                invoice.sent_at.map(|t| t.to_rfc3339()),
                invoice.paid_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS))?;

        let invoice = stmt
            .query_row(params![id.to_string()], row_to_invoice)
            .optional()?;

        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub fn find_by_booking(&self, booking_id: Uuid) -> Result<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invoices WHERE booking_id = ?1 ORDER BY issued_at",
            INVOICE_COLUMNS
        ))?;

        let invoices = stmt
            .query_map(params![booking_id.to_string()], row_to_invoice)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(invoices)
    }

    #[instrument(skip(self))]
    pub fn set_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
        sent_at: Option<DateTime<Utc>>,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE invoices SET status = ?1,
                    sent_at = COALESCE(?2, sent_at),
                    paid_at = COALESCE(?3, paid_at)
             WHERE id = ?4",
            params![
                status.as_str(),
                sent_at.map(|t| t.to_rfc3339()),
                paid_at.map(|t| t.to_rfc3339()),
                id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Sent invoices whose due date has passed
    #[instrument(skip(self))]
    pub fn list_due_before(&self, now: DateTime<Utc>) -> Result<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invoices WHERE status = 'sent' AND due_at < ?1",
            INVOICE_COLUMNS
        ))?;

        let invoices = stmt
            .query_map(params![now.to_rfc3339()], row_to_invoice)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(invoices)
    }

    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM invoices ORDER BY issued_at DESC",
            INVOICE_COLUMNS
        ))?;

        let invoices = stmt
            .query_map([], row_to_invoice)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(invoices)
    }
}
