//! Stats module - dashboard queries and the pricing simulator

mod calculator;
mod dashboard;
mod simulator;

pub use calculator::BasketMeasure;
pub use dashboard::{Dashboard, DashboardOptions};
pub use simulator::{PriceIncrease, DEFAULT_INCREASE_PCT, MAX_INCREASE_PCT};
