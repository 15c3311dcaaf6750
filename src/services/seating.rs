//! seating.rs
//!
//! Модель зала: поиск категории по ряду, цена места, заблокированные места,
//! шаблоны типовых залов и генерация карты мест для события.

use tracing::debug;

use crate::error::{PricingError, PricingResult};
use crate::models::{Seat, SeatCategory, SeatingConfig, VenueType};
use crate::money::ensure_price;

/// Категория, которой принадлежит ряд. При пересечении рядов побеждает
/// первая категория в списке (валидная конфигурация пересечений не содержит).
pub fn category_for_row(row: u32, config: &SeatingConfig) -> Option<&SeatCategory> {
    config.categories().iter().find(|c| c.rows.contains(&row))
}

/// Цена места: цена категории ряда, иначе `default_price`.
pub fn resolve_seat_price(row: u32, seat: u32, config: &SeatingConfig, default_price: f64) -> PricingResult<f64> {
    config.check_bounds(row, seat)?;
    let default_price = ensure_price(default_price)?;

    Ok(category_for_row(row, config)
        .map(|c| c.price)
        .unwrap_or(default_price))
}

pub fn is_blocked(row: u32, seat: u32, config: &SeatingConfig) -> bool {
    config
        .blocked_seats()
        .iter()
        .any(|b| b.row == row && b.seat == seat)
}

/// Предел карты мест одного события. Самый большой шаблон (стадион) - 2000 мест.
pub const MAX_SEAT_MAP: u64 = 20_000;

/// Строит карту мест события: по одному месту на каждую пару (ряд, место).
pub fn generate_seats(config: &SeatingConfig, default_price: f64) -> PricingResult<Vec<Seat>> {
    let default_price = ensure_price(default_price)?;
    let total = config.total_seats();
    if total > MAX_SEAT_MAP {
        return Err(PricingError::SeatMapTooLarge { seats: total, max: MAX_SEAT_MAP });
    }
    let mut seats = Vec::with_capacity(total as usize);

    for row in 1..=config.rows() {
        let category = category_for_row(row, config);
        let price = category.map(|c| c.price).unwrap_or(default_price);
        let category_id = category.map(|c| c.id.clone());

        for number in 1..=config.seats_per_row() {
            let mut seat = Seat::new(row, number, category_id.clone(), price);
            if is_blocked(row, number, config) {
                seat.block()?;
            }
            seats.push(seat);
        }
    }

    debug!(
        "Generated {} seats for {} venue ({} blocked)",
        seats.len(),
        config.venue_type(),
        config.blocked_seats().len()
    );
    Ok(seats)
}

// --- Шаблоны залов ---

struct TemplateCategory {
    id: &'static str,
    name: &'static str,
    color: &'static str,
    price: f64,
    first_row: u32,
    last_row: u32,
}

struct VenueTemplate {
    venue_type: VenueType,
    rows: u32,
    seats_per_row: u32,
    categories: &'static [TemplateCategory],
}

// Категории каждого шаблона делят ряды 1..=rows подряд, без дыр.
const TEMPLATES: &[VenueTemplate] = &[
    VenueTemplate {
        venue_type: VenueType::Theater,
        rows: 15,
        seats_per_row: 20,
        categories: &[
            TemplateCategory { id: "vip", name: "VIP", color: "#FFD700", price: 750.0, first_row: 1, last_row: 3 },
            TemplateCategory { id: "premium", name: "Premium", color: "#C0392B", price: 500.0, first_row: 4, last_row: 8 },
            TemplateCategory { id: "standard", name: "Standard", color: "#2980B9", price: 300.0, first_row: 9, last_row: 15 },
        ],
    },
    VenueTemplate {
        venue_type: VenueType::ConcertHall,
        rows: 20,
        seats_per_row: 30,
        categories: &[
            TemplateCategory { id: "vip", name: "VIP", color: "#FFD700", price: 1000.0, first_row: 1, last_row: 4 },
            TemplateCategory { id: "category_1", name: "Category 1", color: "#8E44AD", price: 600.0, first_row: 5, last_row: 12 },
            TemplateCategory { id: "category_2", name: "Category 2", color: "#27AE60", price: 350.0, first_row: 13, last_row: 20 },
        ],
    },
    VenueTemplate {
        venue_type: VenueType::Stadium,
        rows: 40,
        seats_per_row: 50,
        categories: &[
            TemplateCategory { id: "tribune_a", name: "Tribune A", color: "#E74C3C", price: 800.0, first_row: 1, last_row: 10 },
            TemplateCategory { id: "tribune_b", name: "Tribune B", color: "#F39C12", price: 450.0, first_row: 11, last_row: 25 },
            TemplateCategory { id: "tribune_c", name: "Tribune C", color: "#16A085", price: 250.0, first_row: 26, last_row: 40 },
        ],
    },
    VenueTemplate {
        venue_type: VenueType::Conference,
        rows: 10,
        seats_per_row: 12,
        categories: &[
            TemplateCategory { id: "front", name: "Front", color: "#34495E", price: 200.0, first_row: 1, last_row: 3 },
            TemplateCategory { id: "general", name: "General", color: "#95A5A6", price: 100.0, first_row: 4, last_row: 10 },
        ],
    },
];

/// Типы залов, для которых есть встроенный шаблон.
pub fn template_venue_types() -> Vec<VenueType> {
    TEMPLATES.iter().map(|t| t.venue_type).collect()
}

/// Разворачивает именованный шаблон в проверенную конфигурацию зала.
/// Для `custom` шаблона нет, такой зал собирают вручную.
pub fn from_template(venue_type: VenueType) -> PricingResult<SeatingConfig> {
    let template = TEMPLATES
        .iter()
        .find(|t| t.venue_type == venue_type)
        .ok_or_else(|| PricingError::NoTemplate(venue_type.to_string()))?;

    let categories = template
        .categories
        .iter()
        .map(|c| SeatCategory::new(c.id, c.name, c.color, c.price, c.first_row..=c.last_row))
        .collect();

    SeatingConfig::new(template.venue_type, template.rows, template.seats_per_row, categories, Vec::new())
}
