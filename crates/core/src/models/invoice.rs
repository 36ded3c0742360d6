//! Invoice model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    /// Superseded by a linked credit note
    Credited,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Credited => "credited",
        }
    }
}

/// One billed position on an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub amount_cents: i64,
}

/// A billing document derived from a confirmed booking.
/// Amounts are VAT-inclusive; `net`/`vat` are decomposed from `gross`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub booking_id: Uuid,
    pub customer_name: String,
    pub billing_address: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub net_cents: i64,
    pub vat_cents: i64,
    pub gross_cents: i64,
    /// VAT rate in basis points (1900 = 19%)
    pub vat_rate_bps: i64,
    pub status: InvoiceStatus,
    /// Set on a credit note, linking back to the credited invoice
    pub credit_of: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn is_credit_note(&self) -> bool {
        self.credit_of.is_some()
    }
}
