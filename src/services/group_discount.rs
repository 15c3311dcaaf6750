//! group_discount.rs
//!
//! Групповые скидки: выбор самой выгодной для покупателя ступени
//! и подсказка "добавьте N билетов до следующей скидки".

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PricingError, PricingResult};
use crate::models::GroupTicketTier;
use crate::money::{ensure_amount, ensure_price, round_currency};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiscount {
    /// Сумма скидки, округлённая до копеек.
    pub discount: f64,
    /// Скидка в процентах (0..100).
    pub discount_percentage: f64,
    pub final_price: f64,
    pub applied_tier: Option<GroupTicketTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTierInfo {
    pub has_next_tier: bool,
    pub next_tier: Option<GroupTicketTier>,
    pub tickets_needed: u32,
}

/// Проверяет список ступеней на границе ядра.
pub fn validate_tiers(tiers: &[GroupTicketTier]) -> PricingResult<()> {
    for (index, tier) in tiers.iter().enumerate() {
        if tier.min_tickets == 0 {
            return Err(PricingError::MalformedTier {
                index,
                reason: "minTickets must be at least 1".to_string(),
            });
        }
        if !tier.discount.is_finite() || !(0.0..=1.0).contains(&tier.discount) {
            return Err(PricingError::MalformedTier {
                index,
                reason: format!("discount {} is not a fraction in [0, 1]", tier.discount),
            });
        }
    }
    Ok(())
}

/// Лучшая из подходящих ступеней: наибольшая доля скидки, а не ближайший порог.
/// При равных скидках берётся первая по списку.
pub fn best_tier(quantity: u32, tiers: &[GroupTicketTier]) -> Option<GroupTicketTier> {
    tiers
        .iter()
        .filter(|t| quantity >= t.min_tickets)
        .fold(None, |best: Option<GroupTicketTier>, tier| match best {
            Some(b) if b.discount >= tier.discount => Some(b),
            _ => Some(*tier),
        })
}

pub fn calculate_group_discount(
    base_price: f64,
    quantity: u32,
    tiers: &[GroupTicketTier],
) -> PricingResult<GroupDiscount> {
    let base_price = ensure_price(base_price)?;
    validate_tiers(tiers)?;

    let subtotal = ensure_amount(base_price * f64::from(quantity))?;

    let tier = match best_tier(quantity, tiers) {
        Some(tier) => tier,
        None => {
            return Ok(GroupDiscount {
                discount: 0.0,
                discount_percentage: 0.0,
                final_price: round_currency(subtotal),
                applied_tier: None,
            })
        }
    };

    let discount = round_currency(subtotal * tier.discount);
    let final_price = round_currency(subtotal - discount);

    debug!(
        "Group tier min={} ({}%) applied to {} tickets: -{:.2}",
        tier.min_tickets,
        tier.discount * 100.0,
        quantity,
        discount
    );

    Ok(GroupDiscount {
        discount,
        discount_percentage: round_currency(tier.discount * 100.0),
        final_price,
        applied_tier: Some(tier),
    })
}

/// Ближайшая ступень с порогом строго больше текущего количества.
pub fn next_tier_info(current_quantity: u32, tiers: &[GroupTicketTier]) -> PricingResult<NextTierInfo> {
    validate_tiers(tiers)?;

    let next = tiers
        .iter()
        .filter(|t| t.min_tickets > current_quantity)
        .min_by_key(|t| t.min_tickets)
        .copied();

    Ok(match next {
        Some(tier) => NextTierInfo {
            has_next_tier: true,
            next_tier: Some(tier),
            tickets_needed: tier.min_tickets - current_quantity,
        },
        None => NextTierInfo {
            has_next_tier: false,
            next_tier: None,
            tickets_needed: 0,
        },
    })
}
