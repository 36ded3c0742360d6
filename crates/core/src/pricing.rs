//! Price calculation for reservations
//!
//! Pure arithmetic over resolved package/add-on/merchandise prices.
//! VAT decomposition happens only at invoice construction, never here.

use crate::models::{AddOn, MerchandiseLine};

/// Result of pricing a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

/// Subtotal before any discount: package and add-ons are per guest,
/// merchandise is per line quantity.
pub fn subtotal_cents(
    package_per_guest_cents: i64,
    guests: u32,
    add_ons: &[AddOn],
    merchandise: &[MerchandiseLine],
) -> i64 {
    let guests = i64::from(guests);
    let package = package_per_guest_cents * guests;
    let add_ons: i64 = add_ons.iter().map(|a| a.price_cents * guests).sum();
    let merch: i64 = merchandise.iter().map(MerchandiseLine::subtotal_cents).sum();
    package + add_ons + merch
}

/// Full quote with a discount applied, floored at zero
pub fn quote(
    package_per_guest_cents: i64,
    guests: u32,
    add_ons: &[AddOn],
    merchandise: &[MerchandiseLine],
    discount_cents: i64,
) -> PriceQuote {
    let subtotal = subtotal_cents(package_per_guest_cents, guests, add_ons, merchandise);
    let total = (subtotal - discount_cents).max(0);
    PriceQuote {
        subtotal_cents: subtotal,
        discount_cents,
        total_cents: total,
    }
}
