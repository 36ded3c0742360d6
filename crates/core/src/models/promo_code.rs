//! Promo code model

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a promo code discounts a subtotal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoKind {
    /// `value` is a percentage of the subtotal
    Percentage,
    /// `value` is an amount in cents
    FixedAmount,
    /// `value` is a balance in cents, capped at the subtotal
    GiftCard,
}

impl PromoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromoKind::Percentage => "percentage",
            PromoKind::FixedAmount => "fixed_amount",
            PromoKind::GiftCard => "gift_card",
        }
    }
}

/// A discount or gift-card code applied against a booking subtotal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: Uuid,
    /// Stored uppercase; matching is case-insensitive at the edges
    pub code: String,
    pub kind: PromoKind,
    /// Percent for `Percentage`, cents otherwise
    pub value: i64,
    pub usage_limit: Option<u32>,
    pub times_used: u32,
    pub min_booking_cents: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    pub fn new(code: String, kind: PromoKind, value: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_uppercase(),
            kind,
            value,
            usage_limit: None,
            times_used: 0,
            min_booking_cents: 0,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn with_minimum(mut self, cents: i64) -> Self {
        self.min_booking_cents = cents;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.times_used >= limit,
            None => false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }
}

/// Generate a random 8-character uppercase alphanumeric code
pub fn generate_promo_code() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_code_is_stored_uppercase() {
        let promo = PromoCode::new("summer10".into(), PromoKind::Percentage, 10);
        assert_eq!(promo.code, "SUMMER10");
    }

    #[test]
    fn test_exhaustion_respects_limit() {
        let mut promo = PromoCode::new("GALA".into(), PromoKind::FixedAmount, 500).with_usage_limit(2);
        assert!(!promo.is_exhausted());
        promo.times_used = 2;
        assert!(promo.is_exhausted());
    }

    #[test]
    fn test_no_limit_never_exhausts() {
        let mut promo = PromoCode::new("GALA".into(), PromoKind::FixedAmount, 500);
        promo.times_used = 10_000;
        assert!(!promo.is_exhausted());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let promo =
            PromoCode::new("EARLY".into(), PromoKind::Percentage, 15).with_expiry(now - Duration::hours(1));
        assert!(promo.is_expired(now));

        let promo =
            PromoCode::new("EARLY".into(), PromoKind::Percentage, 15).with_expiry(now + Duration::hours(1));
        assert!(!promo.is_expired(now));
    }

    #[test]
    fn test_generated_code_shape() {
        let code = generate_promo_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase()));
    }
}
