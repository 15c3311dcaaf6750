//! venues.rs
//!
//! Схемы залов для редактора: шаблоны, проверка перед сохранением
//! и генерация карты мест события.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{pricing_error, ApiResult};
use crate::models::venue::SeatingConfigDocument;
use crate::models::{Seat, SeatingConfig, SeatStatus, VenueType};
use crate::services::seating;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues/templates", get(list_templates))
        .route("/venues/templates/{venue_type}", get(get_template))
        .route("/venues/validate", post(validate_config))
        .route("/venues/seat-map", post(seat_map))
}

// GET /api/venues/templates
pub async fn list_templates() -> Json<Vec<VenueType>> {
    Json(seating::template_venue_types())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub config: SeatingConfig,
    pub total_seats: u64,
    /// Ряды без категории; места в них продаются по цене билета.
    pub coverage_gaps: Vec<u32>,
}

impl From<SeatingConfig> for ConfigSummary {
    fn from(config: SeatingConfig) -> Self {
        Self {
            total_seats: config.total_seats(),
            coverage_gaps: config.coverage_gaps(),
            config,
        }
    }
}

// GET /api/venues/templates/{venue_type}
pub async fn get_template(Path(venue_type): Path<String>) -> ApiResult<Json<ConfigSummary>> {
    let venue_type: VenueType = venue_type.parse().map_err(pricing_error)?;
    let config = seating::from_template(venue_type).map_err(pricing_error)?;
    Ok(Json(config.into()))
}

// POST /api/venues/validate
// Пересекающиеся ряды категорий - ошибка конфигурации, отдаём её редактору.
pub async fn validate_config(Json(doc): Json<SeatingConfigDocument>) -> ApiResult<Json<ConfigSummary>> {
    let config = SeatingConfig::try_from(doc).map_err(pricing_error)?;
    Ok(Json(config.into()))
}

// POST /api/venues/seat-map
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapRequest {
    pub config: SeatingConfigDocument,
    pub default_price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapResponse {
    pub total_seats: usize,
    pub available_seats: usize,
    pub blocked_seats: usize,
    pub seats: Vec<Seat>,
}

pub async fn seat_map(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeatMapRequest>,
) -> ApiResult<Json<SeatMapResponse>> {
    // Размер карты ограничивает generate_seats
    let config = SeatingConfig::try_from(req.config).map_err(pricing_error)?;

    let default_price = req.default_price.unwrap_or(state.config.pricing.default_ticket_price);
    let seats = seating::generate_seats(&config, default_price).map_err(pricing_error)?;

    let available_seats = seats.iter().filter(|s| s.status == SeatStatus::Available).count();
    let blocked_seats = seats.iter().filter(|s| s.status == SeatStatus::Blocked).count();

    tracing::info!(
        "Seat map generated: {} seats ({} blocked) for {} venue",
        seats.len(), blocked_seats, config.venue_type()
    );

    Ok(Json(SeatMapResponse {
        total_seats: seats.len(),
        available_seats,
        blocked_seats,
        seats,
    }))
}
