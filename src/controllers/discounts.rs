//! discounts.rs
//!
//! Проверка и погашение промокодов.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use std::sync::Arc;

use super::{discount_error, to_api_error, ApiResult};
use crate::models::DiscountResult;
use crate::services::discount_codes::{DiscountCheck, DiscountCodeValidator};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/discounts/validate", post(validate_code))
        .route("/discounts/redeem", post(redeem_code))
}

// POST /api/discounts/validate
// Невалидный код - это обычный ответ с `valid: false`, а не ошибка.
pub async fn validate_code(
    State(state): State<Arc<AppState>>,
    Json(check): Json<DiscountCheck>,
) -> Json<DiscountResult> {
    if !state.config.features.enable_discount_codes {
        return Json(DiscountResult::invalid("Discount codes are disabled"));
    }
    Json(state.discount_codes.validate(&check, Utc::now()))
}

// POST /api/discounts/redeem
// Вызывается при оформлении заказа, списывает одно использование.
pub async fn redeem_code(
    State(state): State<Arc<AppState>>,
    Json(check): Json<DiscountCheck>,
) -> ApiResult<Json<DiscountResult>> {
    if !state.config.features.enable_discount_codes {
        return Err(to_api_error(StatusCode::FORBIDDEN, "Промокоды отключены"));
    }
    let result = state
        .discount_codes
        .redeem(&check, Utc::now())
        .map_err(discount_error)?;
    Ok(Json(result))
}
