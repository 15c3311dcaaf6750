use serde::{Deserialize, Deserializer, Serialize};

use super::seat::Seat;

/// Запись о месте для калькулятора: координаты и цена, если она известна.
/// Цена приходит из документа как число или строка; всё, что не разбирается
/// в конечное неотрицательное число, считается отсутствующей ценой.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatPriceRecord {
    pub row: u32,
    pub number: u32,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
}

impl SeatPriceRecord {
    pub fn new(row: u32, number: u32, price: Option<f64>) -> Self {
        Self { row, number, price }
    }

    /// Цена, пригодная для расчёта, или `None`.
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p >= 0.0)
    }
}

impl From<&Seat> for SeatPriceRecord {
    fn from(seat: &Seat) -> Self {
        Self {
            row: seat.row,
            number: seat.seat,
            price: Some(seat.price),
        }
    }
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    let raw = Option::<RawPrice>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawPrice::Number(n)) => Some(n),
        Some(RawPrice::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(RawPrice::Other(value)) => {
            tracing::debug!("Ignoring non-numeric seat price {}", value);
            None
        }
        None => None,
    })
}

/// Итог расчёта цены для показа и оформления заказа.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalculation {
    pub subtotal: f64,
    pub group_discount: f64,
    pub group_discount_percentage: f64,
    pub code_discount: f64,
    pub total: f64,
    pub item_count: u32,
}
