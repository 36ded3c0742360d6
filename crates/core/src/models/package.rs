//! Package model - a priced offering guests select

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tier key used when a show slot carries no explicit price tier
pub const DEFAULT_PRICE_TIER: &str = "default";

/// A menu/arrangement offering, priced per person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageOption {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Flat per-guest price. Takes precedence over `price_levels`.
    pub price_cents: Option<i64>,
    /// Per-guest price keyed by show-slot price tier
    pub price_levels: HashMap<String, i64>,
    pub add_ons: Vec<AddOn>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// An optional extra sold with a package, priced per guest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
}

impl PackageOption {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            price_cents: None,
            price_levels: HashMap::new(),
            add_ons: Vec::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_flat_price(mut self, cents: i64) -> Self {
        self.price_cents = Some(cents);
        self
    }

    pub fn with_price_level(mut self, tier: &str, cents: i64) -> Self {
        self.price_levels.insert(tier.to_string(), cents);
        self
    }

    pub fn with_add_on(mut self, name: &str, cents: i64) -> Self {
        self.add_ons.push(AddOn {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price_cents: cents,
        });
        self
    }

    /// Resolve the per-guest price for a slot's tier. Flat price wins;
    /// otherwise the tier level (or the default level) applies.
    pub fn price_per_guest(&self, tier: Option<&str>) -> Option<i64> {
        if let Some(flat) = self.price_cents {
            return Some(flat);
        }
        self.price_levels
            .get(tier.unwrap_or(DEFAULT_PRICE_TIER))
            .copied()
    }

    /// Look up the subset of this package's add-ons matching the given ids
    pub fn selected_add_ons(&self, ids: &[Uuid]) -> Vec<AddOn> {
        self.add_ons
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect()
    }
}
