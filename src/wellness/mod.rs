pub mod commands;
pub mod controller;
pub mod evaluator;

pub use controller::{CheckOutcome, WellnessController};
