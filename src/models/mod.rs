pub mod seat;
pub mod venue;
pub mod discount;
pub mod pricing;

pub use seat::{Seat, SeatDisplayState, SeatSelection, SeatStatus};
pub use venue::{BlockedSeat, SeatCategory, SeatingConfig, VenueType};
pub use discount::{DiscountCode, DiscountResult, DiscountType, GroupTicketTier};
pub use pricing::{PriceCalculation, SeatPriceRecord};
