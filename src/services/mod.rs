pub mod seating;
pub mod group_discount;
pub mod pricing;
pub mod discount_codes;
