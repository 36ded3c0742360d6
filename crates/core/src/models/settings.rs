//! Application settings singleton

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row key of the single settings document
pub const SETTINGS_KEY: &str = "main";

/// Venue-wide configuration, stored as a single row and patched on save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub company_name: String,
    pub company_address: String,
    pub company_email: String,
    /// VAT rate in basis points (1900 = 19%)
    pub vat_rate_bps: i64,
    pub invoice_prefix: String,
    /// Next sequence number consumed by invoice creation
    pub invoice_next_number: u32,
    pub invoice_due_days: i64,
    pub default_show_slot_id: Option<Uuid>,
    pub default_package_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            company_address: String::new(),
            company_email: String::new(),
            vat_rate_bps: 1900,
            invoice_prefix: "INV".to_string(),
            invoice_next_number: 1,
            invoice_due_days: 14,
            default_show_slot_id: None,
            default_package_id: None,
            updated_at: Utc::now(),
        }
    }
}

/// Partial update applied over the stored settings; `None` keeps the
/// current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_email: Option<String>,
    pub vat_rate_bps: Option<i64>,
    pub invoice_prefix: Option<String>,
    pub invoice_due_days: Option<i64>,
    pub default_show_slot_id: Option<Option<Uuid>>,
    pub default_package_id: Option<Option<Uuid>>,
}

impl AppSettings {
    /// Merge a patch, leaving unset fields untouched. The invoice counter
    /// is deliberately not patchable; only invoice creation advances it.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.company_name {
            self.company_name = v;
        }
        if let Some(v) = patch.company_address {
            self.company_address = v;
        }
        if let Some(v) = patch.company_email {
            self.company_email = v;
        }
        if let Some(v) = patch.vat_rate_bps {
            self.vat_rate_bps = v;
        }
        if let Some(v) = patch.invoice_prefix {
            self.invoice_prefix = v;
        }
        if let Some(v) = patch.invoice_due_days {
            self.invoice_due_days = v;
        }
        if let Some(v) = patch.default_show_slot_id {
            self.default_show_slot_id = v;
        }
        if let Some(v) = patch.default_package_id {
            self.default_package_id = v;
        }
        self.updated_at = Utc::now();
    }
}
