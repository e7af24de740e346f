//! Shared domain types.

pub mod collections;
pub mod cycle;
pub mod stage;

pub use cycle::{cycle_schedule, decimal_year, CycleWindow, RepeatCycle};
pub use stage::Stage;
