pub mod pricing;
pub mod venues;
pub mod discounts;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::error::PricingError;
use crate::services::discount_codes::DiscountCodeError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(pricing::routes())
        .merge(venues::routes())
        .merge(discounts::routes())
}

// --- Ошибки API ---

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn to_api_error(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { success: false, message: message.to_string() }))
}

pub fn pricing_error(err: PricingError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        PricingError::NoTemplate(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::warn!("Pricing request rejected: {}", err);
    to_api_error(status, &err.to_string())
}

pub fn discount_error(err: DiscountCodeError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        DiscountCodeError::NotFound(_) => StatusCode::NOT_FOUND,
        DiscountCodeError::Rejected { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    to_api_error(status, &err.to_string())
}

pub fn validation_error(err: validator::ValidationErrors) -> (StatusCode, Json<ApiError>) {
    to_api_error(StatusCode::BAD_REQUEST, &format!("Некорректный запрос: {}", err))
}
