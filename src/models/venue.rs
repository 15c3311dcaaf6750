use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{PricingError, PricingResult};
use crate::money::ensure_price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueType {
    Theater,
    ConcertHall,
    Stadium,
    Conference,
    Custom,
}

impl VenueType {
    pub fn as_str(self) -> &'static str {
        match self {
            VenueType::Theater => "theater",
            VenueType::ConcertHall => "concert_hall",
            VenueType::Stadium => "stadium",
            VenueType::Conference => "conference",
            VenueType::Custom => "custom",
        }
    }
}

impl fmt::Display for VenueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VenueType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theater" => Ok(VenueType::Theater),
            "concert_hall" => Ok(VenueType::ConcertHall),
            "stadium" => Ok(VenueType::Stadium),
            "conference" => Ok(VenueType::Conference),
            "custom" => Ok(VenueType::Custom),
            other => Err(PricingError::NoTemplate(other.to_string())),
        }
    }
}

/// Категория мест: цена и набор рядов, которые она занимает.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatCategory {
    pub id: String,
    pub name: String,
    pub color: String,
    pub price: f64,
    pub rows: BTreeSet<u32>,
}

impl SeatCategory {
    pub fn new(id: &str, name: &str, color: &str, price: f64, rows: impl IntoIterator<Item = u32>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            price,
            rows: rows.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockedSeat {
    pub row: u32,
    pub seat: u32,
}

/// Схема зала. Конструируется только через проверку инвариантов:
/// координаты в пределах зала, ряды категорий не пересекаются.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SeatingConfigDocument")]
pub struct SeatingConfig {
    venue_type: VenueType,
    rows: u32,
    seats_per_row: u32,
    categories: Vec<SeatCategory>,
    blocked_seats: Vec<BlockedSeat>,
}

/// Сырой документ из редактора зала, до проверки.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingConfigDocument {
    pub venue_type: VenueType,
    pub rows: u32,
    pub seats_per_row: u32,
    #[serde(default)]
    pub categories: Vec<SeatCategory>,
    #[serde(default)]
    pub blocked_seats: Vec<BlockedSeat>,
}

impl TryFrom<SeatingConfigDocument> for SeatingConfig {
    type Error = PricingError;

    fn try_from(doc: SeatingConfigDocument) -> Result<Self, Self::Error> {
        SeatingConfig::new(doc.venue_type, doc.rows, doc.seats_per_row, doc.categories, doc.blocked_seats)
    }
}

impl SeatingConfig {
    pub fn new(
        venue_type: VenueType,
        rows: u32,
        seats_per_row: u32,
        categories: Vec<SeatCategory>,
        blocked_seats: Vec<BlockedSeat>,
    ) -> PricingResult<Self> {
        let config = Self {
            venue_type,
            rows,
            seats_per_row,
            categories,
            blocked_seats,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> PricingResult<()> {
        if self.rows == 0 || self.seats_per_row == 0 {
            return Err(PricingError::InvalidSeatingConfig(format!(
                "venue must have at least one row and one seat per row, got {}x{}",
                self.rows, self.seats_per_row
            )));
        }

        for blocked in &self.blocked_seats {
            self.check_bounds(blocked.row, blocked.seat)?;
        }

        let mut ids = HashSet::new();
        let mut owners: HashMap<u32, &str> = HashMap::new();
        for category in &self.categories {
            if category.id.trim().is_empty() {
                return Err(PricingError::InvalidSeatingConfig("category id must not be empty".to_string()));
            }
            if !ids.insert(category.id.as_str()) {
                return Err(PricingError::InvalidSeatingConfig(format!(
                    "duplicate category id '{}'",
                    category.id
                )));
            }
            ensure_price(category.price)?;

            for &row in &category.rows {
                if row == 0 || row > self.rows {
                    return Err(PricingError::InvalidSeatingConfig(format!(
                        "category '{}' claims row {} but the venue has rows 1..={}",
                        category.id, row, self.rows
                    )));
                }
                if let Some(first) = owners.insert(row, category.id.as_str()) {
                    return Err(PricingError::OverlappingCategories {
                        row,
                        first: first.to_string(),
                        second: category.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn venue_type(&self) -> VenueType {
        self.venue_type
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn seats_per_row(&self) -> u32 {
        self.seats_per_row
    }

    pub fn categories(&self) -> &[SeatCategory] {
        &self.categories
    }

    pub fn blocked_seats(&self) -> &[BlockedSeat] {
        &self.blocked_seats
    }

    pub fn total_seats(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.seats_per_row)
    }

    /// Координаты обязаны лежать в `[1, rows] x [1, seatsPerRow]`; не зажимаем.
    pub fn check_bounds(&self, row: u32, seat: u32) -> PricingResult<()> {
        if row == 0 || row > self.rows || seat == 0 || seat > self.seats_per_row {
            return Err(PricingError::SeatOutOfRange {
                row,
                seat,
                rows: self.rows,
                seats_per_row: self.seats_per_row,
            });
        }
        Ok(())
    }

    /// Ряды, которые не занимает ни одна категория. Пустой результат значит,
    /// что категории покрывают зал без пропусков.
    pub fn coverage_gaps(&self) -> Vec<u32> {
        let claimed: HashSet<u32> = self
            .categories
            .iter()
            .flat_map(|c| c.rows.iter().copied())
            .collect();
        (1..=self.rows).filter(|row| !claimed.contains(row)).collect()
    }

    pub fn block_seat(&mut self, row: u32, seat: u32) -> PricingResult<bool> {
        self.check_bounds(row, seat)?;
        let blocked = BlockedSeat { row, seat };
        if self.blocked_seats.contains(&blocked) {
            return Ok(false);
        }
        self.blocked_seats.push(blocked);
        Ok(true)
    }

    pub fn unblock_seat(&mut self, row: u32, seat: u32) -> PricingResult<bool> {
        self.check_bounds(row, seat)?;
        let before = self.blocked_seats.len();
        self.blocked_seats.retain(|b| !(b.row == row && b.seat == seat));
        Ok(self.blocked_seats.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_categories() -> Vec<SeatCategory> {
        vec![
            SeatCategory::new("vip", "VIP", "#FFD700", 500.0, 1..=2),
            SeatCategory::new("std", "Standard", "#4A90D9", 200.0, 3..=5),
        ]
    }

    #[test]
    fn builds_valid_config() {
        let config = SeatingConfig::new(VenueType::Custom, 5, 10, two_categories(), vec![BlockedSeat { row: 5, seat: 10 }]).unwrap();
        assert_eq!(config.total_seats(), 50);
        assert!(config.coverage_gaps().is_empty());
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(
            SeatingConfig::new(VenueType::Custom, 0, 10, vec![], vec![]),
            Err(PricingError::InvalidSeatingConfig(_))
        ));
        assert!(SeatingConfig::new(VenueType::Custom, 3, 0, vec![], vec![]).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_blocked_seat() {
        let err = SeatingConfig::new(VenueType::Custom, 5, 10, vec![], vec![BlockedSeat { row: 6, seat: 1 }]).unwrap_err();
        assert!(matches!(err, PricingError::SeatOutOfRange { row: 6, .. }));
    }

    #[test]
    fn rejects_overlapping_rows() {
        let categories = vec![
            SeatCategory::new("vip", "VIP", "#FFD700", 500.0, 1..=3),
            SeatCategory::new("std", "Standard", "#4A90D9", 200.0, 3..=5),
        ];
        let err = SeatingConfig::new(VenueType::Custom, 5, 10, categories, vec![]).unwrap_err();
        assert_eq!(
            err,
            PricingError::OverlappingCategories { row: 3, first: "vip".into(), second: "std".into() }
        );
    }

    #[test]
    fn rejects_category_rows_outside_venue() {
        let categories = vec![SeatCategory::new("vip", "VIP", "#FFD700", 500.0, [0, 1])];
        assert!(SeatingConfig::new(VenueType::Custom, 5, 10, categories, vec![]).is_err());

        let categories = vec![SeatCategory::new("vip", "VIP", "#FFD700", 500.0, [6])];
        assert!(SeatingConfig::new(VenueType::Custom, 5, 10, categories, vec![]).is_err());
    }

    #[test]
    fn rejects_negative_category_price() {
        let categories = vec![SeatCategory::new("vip", "VIP", "#FFD700", -1.0, [1])];
        assert_eq!(
            SeatingConfig::new(VenueType::Custom, 5, 10, categories, vec![]).unwrap_err(),
            PricingError::InvalidPrice(-1.0)
        );
    }

    #[test]
    fn reports_coverage_gaps() {
        let categories = vec![SeatCategory::new("vip", "VIP", "#FFD700", 500.0, [1, 2, 4])];
        let config = SeatingConfig::new(VenueType::Custom, 5, 10, categories, vec![]).unwrap();
        assert_eq!(config.coverage_gaps(), vec![3, 5]);
    }

    #[test]
    fn deserialization_runs_validation() {
        let ok = r##"{
            "venueType": "custom",
            "rows": 4,
            "seatsPerRow": 6,
            "categories": [{"id": "a", "name": "A", "color": "#fff", "price": 10, "rows": [1, 2]}],
            "blockedSeats": [{"row": 1, "seat": 6}]
        }"##;
        let config: SeatingConfig = serde_json::from_str(ok).unwrap();
        assert_eq!(config.seats_per_row(), 6);
        assert_eq!(config.blocked_seats().len(), 1);

        let overlapping = r##"{
            "venueType": "custom",
            "rows": 4,
            "seatsPerRow": 6,
            "categories": [
                {"id": "a", "name": "A", "color": "#fff", "price": 10, "rows": [1, 2]},
                {"id": "b", "name": "B", "color": "#000", "price": 5, "rows": [2, 3]}
            ]
        }"##;
        let err = serde_json::from_str::<SeatingConfig>(overlapping).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn block_and_unblock_seat() {
        let mut config = SeatingConfig::new(VenueType::Custom, 2, 2, vec![], vec![]).unwrap();
        assert_eq!(config.block_seat(1, 2), Ok(true));
        assert_eq!(config.block_seat(1, 2), Ok(false));
        assert!(config.block_seat(3, 1).is_err());
        assert_eq!(config.unblock_seat(1, 2), Ok(true));
        assert_eq!(config.unblock_seat(1, 2), Ok(false));
    }

    #[test]
    fn venue_type_parses_from_path_segment() {
        assert_eq!("concert_hall".parse::<VenueType>(), Ok(VenueType::ConcertHall));
        assert!("arena".parse::<VenueType>().is_err());
    }
}
