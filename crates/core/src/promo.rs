//! Promo code evaluation
//!
//! Pure eligibility check plus discount computation. Evaluation never
//! mutates `times_used`; the submission transaction increments it after a
//! booking actually applies the code.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{PromoCode, PromoKind};

/// Why a code was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoRejection {
    UnknownCode,
    Inactive,
    Expired,
    UsageLimitReached,
    BelowMinimum { required_cents: i64 },
}

impl fmt::Display for PromoRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromoRejection::UnknownCode => write!(f, "Unknown promo code"),
            PromoRejection::Inactive => write!(f, "This code is no longer active"),
            PromoRejection::Expired => write!(f, "This code has expired"),
            PromoRejection::UsageLimitReached => write!(f, "This code has reached its usage limit"),
            PromoRejection::BelowMinimum { required_cents } => write!(
                f,
                "Booking must be at least {}.{:02} to use this code",
                required_cents / 100,
                required_cents % 100
            ),
        }
    }
}

/// Evaluate a looked-up code against a subtotal. `None` means the code
/// string matched no stored document. Returns the discount in cents,
/// always clamped to the subtotal.
pub fn evaluate(
    promo: Option<&PromoCode>,
    subtotal_cents: i64,
    now: DateTime<Utc>,
) -> Result<i64, PromoRejection> {
    let promo = promo.ok_or(PromoRejection::UnknownCode)?;

    if !promo.is_active {
        return Err(PromoRejection::Inactive);
    }
    if promo.is_expired(now) {
        return Err(PromoRejection::Expired);
    }
    if promo.is_exhausted() {
        return Err(PromoRejection::UsageLimitReached);
    }
    if subtotal_cents < promo.min_booking_cents {
        return Err(PromoRejection::BelowMinimum {
            required_cents: promo.min_booking_cents,
        });
    }

    let discount = match promo.kind {
        PromoKind::Percentage => subtotal_cents * promo.value / 100,
        PromoKind::FixedAmount => promo.value,
        PromoKind::GiftCard => promo.value.min(subtotal_cents),
    };

    Ok(discount.clamp(0, subtotal_cents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn percentage(value: i64) -> PromoCode {
        PromoCode::new("TEN".into(), PromoKind::Percentage, value)
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(evaluate(None, 10_000, Utc::now()), Err(PromoRejection::UnknownCode));
    }

    #[test]
    fn test_percentage_discount() {
        // type=percentage, value=10, subtotal=200.00 -> 20.00
        let promo = percentage(10);
        assert_eq!(evaluate(Some(&promo), 20_000, Utc::now()), Ok(2_000));
    }

    #[test]
    fn test_gift_card_clamps_to_subtotal() {
        // type=gift_card, value=500.00, subtotal=80.00 -> 80.00
        let promo = PromoCode::new("GIFT".into(), PromoKind::GiftCard, 50_000);
        assert_eq!(evaluate(Some(&promo), 8_000, Utc::now()), Ok(8_000));
    }

    #[test]
    fn test_fixed_amount_clamps_to_subtotal() {
        let promo = PromoCode::new("FLAT".into(), PromoKind::FixedAmount, 5_000);
        assert_eq!(evaluate(Some(&promo), 3_000, Utc::now()), Ok(3_000));
        assert_eq!(evaluate(Some(&promo), 9_000, Utc::now()), Ok(5_000));
    }

    #[test]
    fn test_inactive_rejected() {
        let mut promo = percentage(10);
        promo.is_active = false;
        assert_eq!(
            evaluate(Some(&promo), 10_000, Utc::now()),
            Err(PromoRejection::Inactive)
        );
    }

    #[test]
    fn test_expired_rejected() {
        let now = Utc::now();
        let promo = percentage(10).with_expiry(now - Duration::minutes(1));
        assert_eq!(evaluate(Some(&promo), 10_000, now), Err(PromoRejection::Expired));
    }

    #[test]
    fn test_usage_limit_rejected() {
        let mut promo = percentage(10).with_usage_limit(3);
        promo.times_used = 3;
        assert_eq!(
            evaluate(Some(&promo), 10_000, Utc::now()),
            Err(PromoRejection::UsageLimitReached)
        );
    }

    #[test]
    fn test_minimum_amount_rejected() {
        let promo = percentage(10).with_minimum(15_000);
        assert_eq!(
            evaluate(Some(&promo), 10_000, Utc::now()),
            Err(PromoRejection::BelowMinimum { required_cents: 15_000 })
        );
        assert_eq!(evaluate(Some(&promo), 15_000, Utc::now()), Ok(1_500));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let now = Utc::now();
        let promo = percentage(25);
        let first = evaluate(Some(&promo), 12_345, now);
        let second = evaluate(Some(&promo), 12_345, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let now = Utc::now();
        let promo = percentage(150);
        assert_eq!(evaluate(Some(&promo), 10_000, now), Ok(10_000));
    }
}
