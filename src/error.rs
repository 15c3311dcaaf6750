use thiserror::Error;

/// Нарушения входного контракта ядра ценообразования.
///
/// Все варианты означают ошибку вызывающей стороны: молча исправлять такие
/// данные нельзя, иначе клиенту выставят неверную сумму.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("seat ({row}, {seat}) is outside the {rows}x{seats_per_row} venue")]
    SeatOutOfRange {
        row: u32,
        seat: u32,
        rows: u32,
        seats_per_row: u32,
    },

    #[error("invalid price {0}: must be a finite, non-negative amount")]
    InvalidPrice(f64),

    #[error("amount {0} is out of the representable range")]
    AmountOverflow(f64),

    #[error("{count} seats selected, at most {max} allowed")]
    TooManySeats { count: usize, max: u32 },

    #[error("seat map of {seats} seats exceeds the limit of {max}")]
    SeatMapTooLarge { seats: u64, max: u64 },

    #[error("invalid group tier at position {index}: {reason}")]
    MalformedTier { index: usize, reason: String },

    #[error("invalid seating config: {0}")]
    InvalidSeatingConfig(String),

    #[error("row {row} is claimed by both '{first}' and '{second}'")]
    OverlappingCategories {
        row: u32,
        first: String,
        second: String,
    },

    #[error("venue type '{0}' has no built-in template")]
    NoTemplate(String),

    #[error("seat {seat_id} cannot go from {from} to {to}")]
    IllegalTransition {
        seat_id: String,
        from: String,
        to: String,
    },
}

pub type PricingResult<T> = Result<T, PricingError>;
