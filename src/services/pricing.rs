//! pricing.rs
//!
//! Итоговый расчёт цены заказа: подытог по местам или билетам, групповая
//! скидка, затем промокод поверх уже уменьшенной суммы.
//!
//! Порядок шагов:
//! 1.  Подытог: сумма цен выбранных мест, либо `ticket_price * ticket_count`.
//! 2.  Групповая скидка - только для покупки по количеству, с местами не сочетается.
//! 3.  Промокод считается от суммы после групповой скидки.
//! 4.  Итог округляется до копеек и не бывает отрицательным.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PricingError, PricingResult};
use crate::models::seat::parse_seat_id;
use crate::models::{DiscountResult, DiscountType, GroupTicketTier, PriceCalculation, SeatPriceRecord};
use crate::money::{ensure_amount, ensure_price, round_currency};
use crate::services::group_discount::{calculate_group_discount, validate_tiers};

/// Всё, что нужно калькулятору. Промокод уже проверен сервисом промокодов.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInput {
    /// Цена билета и запасная цена для мест без своей цены.
    pub ticket_price: f64,
    #[serde(default)]
    pub ticket_count: u32,
    #[serde(default)]
    pub has_seat_selection: bool,
    #[serde(default)]
    pub selected_seats: Vec<String>,
    #[serde(default)]
    pub seats: Vec<SeatPriceRecord>,
    #[serde(default)]
    pub group_tiers: Vec<GroupTicketTier>,
    #[serde(default)]
    pub applied_discount: Option<DiscountResult>,
}

pub fn calculate_price(input: &PriceInput) -> PricingResult<PriceCalculation> {
    let ticket_price = ensure_price(input.ticket_price)?;
    validate_tiers(&input.group_tiers)?;

    let seat_mode = input.has_seat_selection && !input.selected_seats.is_empty();

    // 1. Подытог
    let (subtotal, item_count) = if seat_mode {
        let sum: f64 = input
            .selected_seats
            .iter()
            .map(|id| selected_seat_price(id, &input.seats, ticket_price))
            .sum();
        (round_currency(sum), seat_count(input.selected_seats.len())?)
    } else {
        (
            round_currency(ticket_price * f64::from(input.ticket_count)),
            input.ticket_count,
        )
    };

    let subtotal = ensure_amount(subtotal)?;

    // 2. Групповая скидка только при покупке без выбора мест
    let (group_discount, group_discount_percentage) = if input.has_seat_selection {
        (0.0, 0.0)
    } else {
        let group = calculate_group_discount(ticket_price, item_count, &input.group_tiers)?;
        (group.discount, group.discount_percentage)
    };

    // 3. Промежуточная сумма
    let running_total = ensure_amount(subtotal - group_discount)?;

    // 4. Промокод поверх групповой скидки
    let code_discount = input
        .applied_discount
        .as_ref()
        .map(|d| code_discount_amount(d, running_total))
        .unwrap_or(0.0);

    // 5. Не уходим в минус
    let total = round_currency(ensure_amount(running_total - code_discount)?.max(0.0));

    debug!(
        "Price calculated: subtotal={:.2} group=-{:.2} code=-{:.2} total={:.2} items={}",
        subtotal, group_discount, code_discount, total, item_count
    );

    Ok(PriceCalculation {
        subtotal,
        group_discount,
        group_discount_percentage,
        code_discount,
        total,
        item_count,
    })
}

fn seat_count(len: usize) -> PricingResult<u32> {
    u32::try_from(len).map_err(|_| PricingError::TooManySeats { count: len, max: u32::MAX })
}

/// Цена выбранного места. Неизвестное место, место без цены или с мусором
/// вместо цены продаётся по `fallback`: продажу из-за пробела в данных не блокируем.
fn selected_seat_price(id: &str, seats: &[SeatPriceRecord], fallback: f64) -> f64 {
    let price = parse_seat_id(id).and_then(|(row, number)| {
        seats
            .iter()
            .find(|s| s.row == row && s.number == number)
            .and_then(SeatPriceRecord::usable_price)
    });

    match price {
        Some(price) => price,
        None => {
            debug!("Seat {} has no usable price, falling back to {:.2}", id, fallback);
            fallback
        }
    }
}

/// Скидка по промокоду от `running_total`. Невалидный код даёт 0.
/// Кривая запись (нет `value`/`discountAmount` под свой тип, отрицательные
/// или нечисловые значения) тоже даёт 0 - оформление заказа не падает.
pub fn code_discount_amount(discount: &DiscountResult, running_total: f64) -> f64 {
    if !discount.valid {
        return 0.0;
    }

    let usable = |v: Option<f64>| v.filter(|v| v.is_finite() && *v >= 0.0);

    let amount = match discount.discount_type {
        Some(DiscountType::Percentage) => usable(discount.value).map(|pct| running_total * (pct / 100.0)),
        Some(DiscountType::Fixed) => usable(discount.discount_amount),
        None => None,
    };

    match amount.filter(|a| a.is_finite()) {
        Some(amount) => round_currency(amount),
        None => {
            warn!("Ignoring malformed discount result: {:?}", discount);
            0.0
        }
    }
}
