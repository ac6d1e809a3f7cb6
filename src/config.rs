//! Runtime configuration shared by the desktop and export surfaces.

use crate::data::{LoadOptions, UnmatchedPolicy};
use crate::stats::{BasketMeasure, DashboardOptions, PriceIncrease};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_SALES_PATH: &str = "pizza_sales.csv";
pub const DEFAULT_TYPES_PATH: &str = "pizza_types.csv";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub sales_path: PathBuf,
    pub types_path: PathBuf,
    pub unmatched: UnmatchedPolicy,
    pub basket: BasketMeasure,
    pub increase: PriceIncrease,
    /// Set in headless mode; charts and `dashboard.json` land here.
    pub export_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sales_path: PathBuf::from(DEFAULT_SALES_PATH),
            types_path: PathBuf::from(DEFAULT_TYPES_PATH),
            unmatched: UnmatchedPolicy::default(),
            basket: BasketMeasure::default(),
            increase: PriceIncrease::default(),
            export_dir: None,
        }
    }
}

impl DashboardConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            unmatched: self.unmatched,
        }
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            basket: self.basket,
            increase: self.increase,
            ..DashboardOptions::default()
        }
    }
}
