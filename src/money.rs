//! Денежные помощники: все суммы храним в f64 в основных единицах валюты,
//! округляем только до копеек.

use crate::error::{PricingError, PricingResult};

// Компенсирует ошибку представления вроде 1.005 * 100 = 100.49999...
const HALF_CENT_EPSILON: f64 = 1e-9;

/// Округление до 2 знаков по правилу half-up.
pub fn round_currency(amount: f64) -> f64 {
    let scaled = amount.abs() * 100.0;
    let cents = (scaled + 0.5 + HALF_CENT_EPSILON).floor();
    cents.copysign(amount) / 100.0
}

/// Проверяет, что цена конечна и неотрицательна.
pub fn ensure_price(amount: f64) -> PricingResult<f64> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(PricingError::InvalidPrice(amount))
    }
}

/// Сумма после арифметики тоже должна остаться конечной: `inf` или `NaN`
/// дальше превратились бы в бесплатный или бесконечный заказ.
pub fn ensure_amount(amount: f64) -> PricingResult<f64> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(PricingError::AmountOverflow(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_on_cent_boundary() {
        assert_eq!(round_currency(9.999), 10.0);
        assert_eq!(round_currency(0.125), 0.13);
        assert_eq!(round_currency(1.005), 1.01);
        assert_eq!(round_currency(12.344), 12.34);
    }

    #[test]
    fn keeps_exact_amounts() {
        assert_eq!(round_currency(0.0), 0.0);
        assert_eq!(round_currency(150.0), 150.0);
        assert_eq!(round_currency(89.99), 89.99);
    }

    #[test]
    fn rejects_negative_and_nan_prices() {
        assert_eq!(ensure_price(10.5), Ok(10.5));
        assert!(ensure_price(-0.01).is_err());
        assert!(ensure_price(f64::NAN).is_err());
        assert!(ensure_price(f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_non_finite_amounts() {
        assert_eq!(ensure_amount(1e308), Ok(1e308));
        assert_eq!(ensure_amount(f64::INFINITY), Err(PricingError::AmountOverflow(f64::INFINITY)));
        assert!(ensure_amount(f64::NAN).is_err());
    }
}
