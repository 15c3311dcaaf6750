use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{PricingError, PricingResult};

/// Статус места в рамках одной продажи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Reserved,
    Sold,
    Blocked,
}

impl SeatStatus {
    /// Выбрать можно только свободное место. `Reserved` держит кто-то другой,
    /// поэтому для покупателя оно такое же недоступное, как `Sold`.
    pub fn is_selectable(self) -> bool {
        matches!(self, SeatStatus::Available)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Reserved => "reserved",
            SeatStatus::Sold => "sold",
            SeatStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Идентификатор места: `"{row}-{seat}"`, уникален в пределах конфигурации.
pub fn seat_id(row: u32, seat: u32) -> String {
    format!("{}-{}", row, seat)
}

/// Разбирает идентификатор места обратно в координаты.
pub fn parse_seat_id(id: &str) -> Option<(u32, u32)> {
    let (row, seat) = id.trim().split_once('-')?;
    let row = row.parse().ok()?;
    let seat = seat.parse().ok()?;
    Some((row, seat))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: String,
    pub row: u32,
    pub seat: u32,
    pub status: SeatStatus,
    pub category: Option<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_at: Option<DateTime<Utc>>,
}

impl Seat {
    pub fn new(row: u32, seat: u32, category: Option<String>, price: f64) -> Self {
        Self {
            id: seat_id(row, seat),
            row,
            seat,
            status: SeatStatus::Available,
            category,
            price,
            reserved_by: None,
            reserved_at: None,
            sold_to: None,
            sold_at: None,
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.status.is_selectable()
    }

    /// Состояние для карты зала. Недоступность важнее выбора: если место
    /// успели продать, пока оно лежало в выборе, показываем его занятым.
    pub fn display_state(&self, selection: &SeatSelection) -> SeatDisplayState {
        if !self.is_selectable() {
            SeatDisplayState::Unavailable
        } else if selection.contains(&self.id) {
            SeatDisplayState::Selected
        } else {
            SeatDisplayState::Selectable
        }
    }

    // === Жизненный цикл: available -> reserved -> sold, available <-> blocked ===

    pub fn reserve(&mut self, by: impl Into<String>, at: DateTime<Utc>) -> PricingResult<()> {
        self.transition(SeatStatus::Reserved)?;
        self.reserved_by = Some(by.into());
        self.reserved_at = Some(at);
        Ok(())
    }

    /// Продажа разрешена из `reserved` и напрямую из `available` (продажа на входе).
    pub fn sell(&mut self, to: impl Into<String>, at: DateTime<Utc>) -> PricingResult<()> {
        self.transition(SeatStatus::Sold)?;
        self.sold_to = Some(to.into());
        self.sold_at = Some(at);
        Ok(())
    }

    pub fn block(&mut self) -> PricingResult<()> {
        self.transition(SeatStatus::Blocked)
    }

    pub fn unblock(&mut self) -> PricingResult<()> {
        self.transition(SeatStatus::Available)
    }

    fn transition(&mut self, to: SeatStatus) -> PricingResult<()> {
        use SeatStatus::*;

        let allowed = matches!(
            (self.status, to),
            (Available, Reserved) | (Available, Sold) | (Reserved, Sold) | (Available, Blocked) | (Blocked, Available)
        );
        if !allowed {
            return Err(PricingError::IllegalTransition {
                seat_id: self.id.clone(),
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        tracing::debug!("Seat {} {} -> {}", self.id, self.status, to);
        self.status = to;
        Ok(())
    }
}

/// Как место выглядит для конкретного покупателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatDisplayState {
    Selectable,
    Selected,
    Unavailable,
}

/// Текущий выбор мест покупателя (по идентификаторам).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSelection {
    ids: BTreeSet<String>,
}

impl SeatSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// Добавляет или убирает место. Снять выбор можно всегда, добавить - только
    /// свободное место. Возвращает `true`, если место теперь выбрано.
    pub fn toggle(&mut self, seat: &Seat) -> PricingResult<bool> {
        if self.ids.remove(&seat.id) {
            return Ok(false);
        }
        if !seat.is_selectable() {
            return Err(PricingError::IllegalTransition {
                seat_id: seat.id.clone(),
                from: seat.status.to_string(),
                to: "selected".to_string(),
            });
        }
        self.ids.insert(seat.id.clone());
        Ok(true)
    }

    /// Выкидывает места, которые перестали быть свободными после свежего чтения.
    /// Возвращает идентификаторы выброшенных мест.
    pub fn retain_available(&mut self, seats: &[Seat]) -> Vec<String> {
        let mut dropped = Vec::new();
        self.ids.retain(|id| {
            let keep = seats
                .iter()
                .find(|s| &s.id == id)
                .map(|s| s.is_selectable())
                .unwrap_or(false);
            if !keep {
                dropped.push(id.clone());
            }
            keep
        });
        dropped
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat_with(status: SeatStatus) -> Seat {
        let mut seat = Seat::new(3, 7, Some("vip".to_string()), 500.0);
        seat.status = status;
        seat
    }

    #[test]
    fn only_available_is_selectable() {
        assert!(SeatStatus::Available.is_selectable());
        for status in [SeatStatus::Sold, SeatStatus::Blocked, SeatStatus::Reserved] {
            assert!(!status.is_selectable(), "{} must not be selectable", status);
            assert!(!seat_with(status).is_selectable());
        }
    }

    #[test]
    fn seat_id_roundtrips_coordinates() {
        assert_eq!(seat_id(12, 4), "12-4");
        assert_eq!(parse_seat_id("12-4"), Some((12, 4)));
        assert_eq!(parse_seat_id(" 1-1 "), Some((1, 1)));
        assert_eq!(parse_seat_id("A-4"), None);
        assert_eq!(parse_seat_id("12"), None);
        assert_eq!(parse_seat_id("-1-2"), None);
    }

    #[test]
    fn sale_lifecycle_is_monotonic() {
        let now = Utc::now();
        let mut seat = seat_with(SeatStatus::Available);

        seat.reserve("user-1", now).unwrap();
        assert_eq!(seat.status, SeatStatus::Reserved);
        assert_eq!(seat.reserved_by.as_deref(), Some("user-1"));

        // второй резерв того же места запрещён
        assert!(seat.reserve("user-2", now).is_err());

        seat.sell("user-1", now).unwrap();
        assert_eq!(seat.status, SeatStatus::Sold);
        assert_eq!(seat.sold_to.as_deref(), Some("user-1"));

        assert!(seat.sell("user-2", now).is_err());
        assert!(seat.unblock().is_err());
        assert!(seat.block().is_err());
        assert_eq!(seat.status, SeatStatus::Sold);
    }

    #[test]
    fn direct_sale_from_available() {
        let mut seat = seat_with(SeatStatus::Available);
        seat.sell("door", Utc::now()).unwrap();
        assert_eq!(seat.status, SeatStatus::Sold);
    }

    #[test]
    fn block_and_unblock_only_from_matching_state() {
        let mut seat = seat_with(SeatStatus::Available);
        seat.block().unwrap();
        assert_eq!(seat.status, SeatStatus::Blocked);
        assert!(seat.reserve("user-1", Utc::now()).is_err());
        seat.unblock().unwrap();
        assert_eq!(seat.status, SeatStatus::Available);

        let mut reserved = seat_with(SeatStatus::Reserved);
        assert!(reserved.block().is_err());
    }

    #[test]
    fn display_state_prefers_unavailable_over_selected() {
        let mut selection = SeatSelection::new();
        let mut seat = seat_with(SeatStatus::Available);
        assert_eq!(seat.display_state(&selection), SeatDisplayState::Selectable);

        assert!(selection.toggle(&seat).unwrap());
        assert_eq!(seat.display_state(&selection), SeatDisplayState::Selected);

        seat.status = SeatStatus::Reserved;
        assert_eq!(seat.display_state(&selection), SeatDisplayState::Unavailable);
    }

    #[test]
    fn toggle_refuses_unavailable_seats_but_always_deselects() {
        let mut selection = SeatSelection::new();
        let sold = seat_with(SeatStatus::Sold);
        assert!(selection.toggle(&sold).is_err());
        assert!(selection.is_empty());

        let mut seat = seat_with(SeatStatus::Available);
        selection.toggle(&seat).unwrap();
        seat.status = SeatStatus::Sold;
        assert_eq!(selection.toggle(&seat), Ok(false));
        assert!(selection.is_empty());
    }

    #[test]
    fn retain_available_drops_taken_seats() {
        let mut selection = SeatSelection::new();
        let a = Seat::new(1, 1, None, 100.0);
        let b = Seat::new(1, 2, None, 100.0);
        selection.toggle(&a).unwrap();
        selection.toggle(&b).unwrap();

        let mut fresh_b = b.clone();
        fresh_b.status = SeatStatus::Sold;
        let dropped = selection.retain_available(&[a.clone(), fresh_b]);

        assert_eq!(dropped, vec!["1-2".to_string()]);
        assert_eq!(selection.ids(), vec!["1-1".to_string()]);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SeatStatus::Blocked).unwrap();
        assert_eq!(json, "\"blocked\"");
        let parsed: SeatStatus = serde_json::from_str("\"reserved\"").unwrap();
        assert_eq!(parsed, SeatStatus::Reserved);
    }
}
