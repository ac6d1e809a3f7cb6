//! Dashboard snapshot: every KPI, chart series and the simulation for one
//! filter combination.

use super::calculator::{
    BasketBin, BasketMeasure, CategoryRevenue, HourlyDemand, Kpis, PizzaRevenue, PizzaVolume,
    QueryResult, ReportCalculator, SizePrice, SizeShare, SizeTicket, WeekdayDemand, RANKING_SIZE,
};
use super::simulator::{simulate, PriceIncrease, Simulation, SizeBaseline, DEFAULT_SIMULATED_SIZE};
use polars::prelude::DataFrame;
use serde::Serialize;

/// Parameters of the queries that take one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOptions {
    pub basket: BasketMeasure,
    pub increase: PriceIncrease,
    pub simulated_size: String,
    pub ranking_size: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            basket: BasketMeasure::default(),
            increase: PriceIncrease::default(),
            simulated_size: DEFAULT_SIMULATED_SIZE.to_string(),
            ranking_size: RANKING_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub rows: usize,
    pub kpis: Kpis,
    pub top_sellers: Vec<PizzaRevenue>,
    pub weak_sellers: Vec<PizzaVolume>,
    pub hourly_demand: Vec<HourlyDemand>,
    pub weekly_demand: Vec<WeekdayDemand>,
    pub size_mix: Vec<SizeShare>,
    pub category_mix: Vec<CategoryRevenue>,
    pub ticket_by_size: Vec<SizeTicket>,
    pub basket_distribution: Vec<BasketBin>,
    pub price_by_size: Vec<SizePrice>,
    pub simulation: Simulation,
}

impl Dashboard {
    /// Run every query over an already filtered frame.
    pub fn compute(filtered: &DataFrame, options: &DashboardOptions) -> QueryResult<Self> {
        let baseline = SizeBaseline::from_frame(filtered, &options.simulated_size)?;

        Ok(Self {
            rows: filtered.height(),
            kpis: ReportCalculator::kpis(filtered)?,
            top_sellers: ReportCalculator::top_sellers(filtered, options.ranking_size)?,
            weak_sellers: ReportCalculator::weak_sellers(filtered, options.ranking_size)?,
            hourly_demand: ReportCalculator::hourly_demand(filtered)?,
            weekly_demand: ReportCalculator::weekly_demand(filtered)?,
            size_mix: ReportCalculator::size_mix(filtered)?,
            category_mix: ReportCalculator::category_mix(filtered)?,
            ticket_by_size: ReportCalculator::average_ticket_by_size(filtered)?,
            basket_distribution: ReportCalculator::basket_distribution(filtered, options.basket)?,
            price_by_size: ReportCalculator::average_price_by_size(filtered)?,
            simulation: simulate(&baseline, options.increase),
        })
    }

    /// Re-run only the simulation, e.g. after the slider moved.
    pub fn resimulate(&mut self, increase: PriceIncrease) {
        let baseline = SizeBaseline {
            size: self.simulation.size.clone(),
            quantity: self.simulation.quantity,
            revenue: self.simulation.current_revenue,
        };
        self.simulation = simulate(&baseline, increase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_table;
    use crate::data::{DateRange, FilterSelection};

    #[test]
    fn full_dashboard_over_fixture() {
        let table = fixture_table();
        let filtered = FilterSelection::everything(&table).apply(&table).unwrap();
        let dashboard = Dashboard::compute(&filtered, &DashboardOptions::default()).unwrap();

        assert_eq!(dashboard.rows, 9);
        assert_eq!(dashboard.kpis.total_pizzas, 13);
        assert_eq!(dashboard.top_sellers.len(), 5);
        assert_eq!(dashboard.weekly_demand.len(), 7);
        assert_eq!(dashboard.simulation.quantity, 3);
        assert_eq!(dashboard.simulation.increase_pct, 15);
    }

    #[test]
    fn empty_selection_degrades_gracefully() {
        let table = fixture_table();
        let filtered = FilterSelection::new(Vec::new(), DateRange::Unbounded)
            .apply(&table)
            .unwrap();
        let dashboard = Dashboard::compute(&filtered, &DashboardOptions::default()).unwrap();

        assert_eq!(dashboard.rows, 0);
        assert_eq!(dashboard.kpis.average_ticket, 0.0);
        assert!(dashboard.top_sellers.is_empty());
        assert_eq!(dashboard.simulation.projected_revenue, 0.0);
    }

    #[test]
    fn resimulate_matches_full_compute() {
        let table = fixture_table();
        let filtered = table.frame();
        let mut dashboard = Dashboard::compute(filtered, &DashboardOptions::default()).unwrap();

        let increase = PriceIncrease::new(30).unwrap();
        dashboard.resimulate(increase);
        let options = DashboardOptions {
            increase,
            ..DashboardOptions::default()
        };
        let fresh = Dashboard::compute(filtered, &options).unwrap();
        assert_eq!(dashboard.simulation, fresh.simulation);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let table = fixture_table();
        let dashboard = Dashboard::compute(table.frame(), &DashboardOptions::default()).unwrap();
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["kpis"]["unique_orders"], 6);
        assert_eq!(json["weekly_demand"][0]["weekday"], "Monday");
    }
}
