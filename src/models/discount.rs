use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ступень групповой скидки: от `min_tickets` билетов скидка `discount` (доля 0..1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTicketTier {
    pub min_tickets: u32,
    pub discount: f64,
}

impl GroupTicketTier {
    pub fn new(min_tickets: u32, discount: f64) -> Self {
        Self { min_tickets, discount }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Результат проверки промокода. Приходит от сервиса промокодов,
/// калькулятор смотрит только на `valid`, `type`, `value` и `discount_amount`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountResult {
    pub valid: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscountResult {
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn percentage(value: f64, discount_amount: f64) -> Self {
        Self {
            valid: true,
            discount_type: Some(DiscountType::Percentage),
            value: Some(value),
            discount_amount: Some(discount_amount),
            error: None,
        }
    }

    pub fn fixed(amount: f64) -> Self {
        Self {
            valid: true,
            discount_type: Some(DiscountType::Fixed),
            value: Some(amount),
            discount_amount: Some(amount),
            error: None,
        }
    }
}

/// Промокод в том виде, в каком его хранит сервис промокодов.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    /// Процент (0..100) для `percentage`, сумма для `fixed`.
    pub value: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub max_uses_per_user: Option<u32>,
    #[serde(default)]
    pub min_purchase: Option<f64>,
    /// Пустой список - код действует на все категории.
    #[serde(default)]
    pub categories: Vec<String>,
}

fn default_active() -> bool {
    true
}
