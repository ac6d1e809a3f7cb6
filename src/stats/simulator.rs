//! Pricing Simulator
//! What-if projection of a price increase on one pizza size.
//!
//! Volume is held constant: the projection assumes perfectly inelastic
//! demand and models no customer reaction to the new price.

use super::calculator::QueryResult;
use crate::data::columns;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Size the simulator targets by default.
pub const DEFAULT_SIMULATED_SIZE: &str = "XL";
/// Largest increase the slider offers, in percent.
pub const MAX_INCREASE_PCT: u8 = 50;
/// Increase preselected on the slider.
pub const DEFAULT_INCREASE_PCT: u8 = 15;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationError {
    #[error("price increase must be between 0 and 50%, got {0}%")]
    OutOfRange(u32),
}

/// A whole-percent price increase in `0..=MAX_INCREASE_PCT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceIncrease(u8);

impl PriceIncrease {
    pub fn new(percent: u32) -> Result<Self, SimulationError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= MAX_INCREASE_PCT)
            .map(Self)
            .ok_or(SimulationError::OutOfRange(percent))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    fn factor(self) -> f64 {
        1.0 + f64::from(self.0) / 100.0
    }
}

impl Default for PriceIncrease {
    fn default() -> Self {
        Self(DEFAULT_INCREASE_PCT)
    }
}

/// Realized sales of one size within the filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeBaseline {
    pub size: String,
    pub quantity: i64,
    pub revenue: f64,
}

impl SizeBaseline {
    pub fn from_frame(df: &DataFrame, size: &str) -> QueryResult<Self> {
        let subset = df
            .clone()
            .lazy()
            .filter(col(columns::PIZZA_SIZE).eq(lit(size)))
            .select([col(columns::QUANTITY).sum(), col(columns::REVENUE).sum()])
            .collect()?;

        let quantity = subset.column(columns::QUANTITY)?.i64()?.get(0).unwrap_or(0);
        let revenue = subset.column(columns::REVENUE)?.f64()?.get(0).unwrap_or(0.0);

        Ok(Self {
            size: size.to_string(),
            quantity,
            revenue,
        })
    }

    /// Realized revenue per pizza; 0 when nothing was sold.
    pub fn average_price(&self) -> f64 {
        if self.quantity > 0 {
            self.revenue / self.quantity as f64
        } else {
            0.0
        }
    }
}

/// Outcome of one what-if run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub size: String,
    pub increase_pct: u8,
    pub quantity: i64,
    pub current_price: f64,
    pub simulated_price: f64,
    pub current_revenue: f64,
    pub projected_revenue: f64,
    pub net_gain: f64,
}

/// Project the revenue of `baseline` under `increase`.
///
/// Projected revenue is `quantity × simulated_price`, computed as
/// `current_revenue × factor` so that a 0% increase reproduces the current
/// revenue exactly.
pub fn simulate(baseline: &SizeBaseline, increase: PriceIncrease) -> Simulation {
    let current_price = baseline.average_price();
    let simulated_price = current_price * increase.factor();
    let projected_revenue = if baseline.quantity > 0 {
        baseline.revenue * increase.factor()
    } else {
        0.0
    };

    Simulation {
        size: baseline.size.clone(),
        increase_pct: increase.percent(),
        quantity: baseline.quantity,
        current_price,
        simulated_price,
        current_revenue: baseline.revenue,
        projected_revenue,
        net_gain: projected_revenue - baseline.revenue,
    }
}
