//! pricing.rs
//!
//! HTTP-обёртка над калькулятором цены.
//!
//! - `POST /api/pricing/quote` - полный расчёт заказа с промокодом.
//! - `POST /api/pricing/group-discount` - только групповая скидка.
//! - `POST /api/pricing/next-tier` - сколько билетов добавить до следующей скидки.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{pricing_error, validation_error, ApiResult};
use crate::models::{DiscountResult, GroupTicketTier, PriceCalculation, SeatPriceRecord};
use crate::services::discount_codes::{DiscountCheck, DiscountCodeValidator};
use crate::services::group_discount::{calculate_group_discount, next_tier_info, GroupDiscount, NextTierInfo};
use crate::services::pricing::{calculate_price, PriceInput};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pricing/quote", post(quote))
        .route("/pricing/group-discount", post(group_discount))
        .route("/pricing/next-tier", post(next_tier))
}

// --- POST /api/pricing/quote ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Без цены берём `DEFAULT_TICKET_PRICE`.
    #[validate(range(min = 0.0))]
    pub ticket_price: Option<f64>,
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
    #[validate(length(min = 1, max = 64))]
    pub discount_code: Option<String>,
    pub user_id: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub quote_id: Uuid,
    pub currency: String,
    #[serde(flatten)]
    pub calculation: PriceCalculation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<NextTierInfo>,
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<Json<QuoteResponse>> {
    req.validate().map_err(validation_error)?;

    let mut input = PriceInput {
        ticket_price: req.ticket_price.unwrap_or(state.config.pricing.default_ticket_price),
        ticket_count: req.ticket_count,
        has_seat_selection: req.has_seat_selection,
        selected_seats: req.selected_seats,
        seats: req.seats,
        group_tiers: req.group_tiers,
        applied_discount: None,
    };

    // 1. Расчёт без промокода: код применяется к сумме после групповой скидки
    let base = calculate_price(&input).map_err(pricing_error)?;

    // 2. Проверяем промокод, если он есть и промокоды включены
    let discount = match req.discount_code {
        Some(code) if state.config.features.enable_discount_codes => {
            let check = DiscountCheck {
                code,
                user_id: req.user_id,
                purchase_amount: base.subtotal - base.group_discount,
                category: req.category,
            };
            Some(state.discount_codes.validate(&check, Utc::now()))
        }
        Some(_) => Some(DiscountResult::invalid("Discount codes are disabled")),
        None => None,
    };

    // 3. Итог с промокодом
    input.applied_discount = discount.clone();
    let calculation = calculate_price(&input).map_err(pricing_error)?;

    let next_tier = if input.has_seat_selection || input.group_tiers.is_empty() {
        None
    } else {
        Some(next_tier_info(calculation.item_count, &input.group_tiers).map_err(pricing_error)?)
    };

    let quote_id = Uuid::new_v4();
    tracing::info!(
        "Quote {}: {} items, total {:.2} {}",
        quote_id, calculation.item_count, calculation.total, state.config.pricing.currency
    );

    Ok(Json(QuoteResponse {
        quote_id,
        currency: state.config.pricing.currency.clone(),
        calculation,
        discount,
        next_tier,
    }))
}

// --- POST /api/pricing/group-discount ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiscountRequest {
    #[validate(range(min = 0.0))]
    pub base_price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub tiers: Vec<GroupTicketTier>,
}

pub async fn group_discount(Json(req): Json<GroupDiscountRequest>) -> ApiResult<Json<GroupDiscount>> {
    req.validate().map_err(validation_error)?;
    let result = calculate_group_discount(req.base_price, req.quantity, &req.tiers).map_err(pricing_error)?;
    Ok(Json(result))
}

// --- POST /api/pricing/next-tier ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTierRequest {
    pub current_quantity: u32,
    #[serde(default)]
    pub tiers: Vec<GroupTicketTier>,
}

pub async fn next_tier(Json(req): Json<NextTierRequest>) -> ApiResult<Json<NextTierInfo>> {
    let info = next_tier_info(req.current_quantity, &req.tiers).map_err(pricing_error)?;
    Ok(Json(info))
}
