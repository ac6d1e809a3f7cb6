//! Charts module - chart series and rendering
//!
//! [`ChartData`] is the backend-neutral description of one dashboard chart;
//! the interactive plotter and the static PNG renderer both draw from it.

mod plotter;
mod renderer;

pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};

use crate::stats::Dashboard;

/// Highlight colour used by most charts.
pub const GOLD: [u8; 3] = [0xFF, 0xC3, 0x00];
/// Colour of the weak-seller ranking.
pub const ALERT: [u8; 3] = [0xFF, 0x57, 0x33];
/// Current-revenue bar of the simulation.
pub const SLATE: [u8; 3] = [0x55, 0x55, 0x55];
/// Projected-revenue bar of the simulation.
pub const GAIN: [u8; 3] = [0x00, 0xC8, 0x51];

/// Slice colours for the donut chart.
pub const SLICE_PALETTE: [[u8; 3]; 6] = [
    [0xFF, 0xC3, 0x00],
    [0xFF, 0x57, 0x33],
    [0xC7, 0x00, 0x39],
    [0x90, 0x0C, 0x3F],
    [0x58, 0x18, 0x45],
    [0x2E, 0x86, 0xC1],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Labels on the vertical axis, bars grow to the right.
    HorizontalBar,
    VerticalBar,
    Line,
    Donut,
}

/// One labelled series ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub id: &'static str,
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub kind: ChartKind,
    pub points: Vec<(String, f64)>,
    /// One colour per point, or a single colour for the whole series.
    pub colors: Vec<[u8; 3]>,
}

impl ChartData {
    pub fn color_for(&self, index: usize) -> [u8; 3] {
        match self.colors.len() {
            0 => GOLD,
            1 => self.colors[0],
            n => self.colors[index % n],
        }
    }

    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|(_, v)| *v).fold(0.0, f64::max)
    }

    /// The ten dashboard charts, in display order.
    pub fn from_dashboard(dashboard: &Dashboard) -> Vec<ChartData> {
        let sim = &dashboard.simulation;

        vec![
            ChartData {
                id: "top_sellers",
                title: "Top Sellers (Revenue)".into(),
                x_label: "Revenue ($)",
                y_label: "",
                kind: ChartKind::HorizontalBar,
                points: dashboard
                    .top_sellers
                    .iter()
                    .map(|p| (p.pizza_name.clone(), p.revenue))
                    .collect(),
                colors: vec![GOLD],
            },
            ChartData {
                id: "weak_sellers",
                title: "Weak Sellers (Quantity)".into(),
                x_label: "Pizzas Sold",
                y_label: "",
                kind: ChartKind::HorizontalBar,
                points: dashboard
                    .weak_sellers
                    .iter()
                    .map(|p| (p.pizza_name.clone(), p.quantity as f64))
                    .collect(),
                colors: vec![ALERT],
            },
            ChartData {
                id: "hourly_demand",
                title: "Hourly Demand".into(),
                x_label: "Hour of Day",
                y_label: "Pizzas Sold",
                kind: ChartKind::Line,
                points: dashboard
                    .hourly_demand
                    .iter()
                    .map(|h| (h.hour.to_string(), h.quantity as f64))
                    .collect(),
                colors: vec![GOLD],
            },
            ChartData {
                id: "weekly_demand",
                title: "Sales by Day of Week".into(),
                x_label: "Day of Week",
                y_label: "Pizzas Sold",
                kind: ChartKind::VerticalBar,
                points: dashboard
                    .weekly_demand
                    .iter()
                    .map(|d| (d.weekday.to_string(), d.quantity as f64))
                    .collect(),
                colors: vec![GOLD],
            },
            ChartData {
                id: "size_mix",
                title: "Sales Distribution by Size".into(),
                x_label: "",
                y_label: "",
                kind: ChartKind::Donut,
                points: dashboard
                    .size_mix
                    .iter()
                    .map(|s| (s.size.clone(), s.quantity as f64))
                    .collect(),
                colors: SLICE_PALETTE.to_vec(),
            },
            ChartData {
                id: "category_mix",
                title: "Revenue by Category".into(),
                x_label: "Category",
                y_label: "Revenue ($)",
                kind: ChartKind::VerticalBar,
                points: dashboard
                    .category_mix
                    .iter()
                    .map(|c| (c.category.clone(), c.revenue))
                    .collect(),
                colors: vec![GOLD],
            },
            ChartData {
                id: "ticket_by_size",
                title: "Average Ticket by Size ($)".into(),
                x_label: "Size",
                y_label: "Average Ticket ($)",
                kind: ChartKind::VerticalBar,
                points: dashboard
                    .ticket_by_size
                    .iter()
                    .map(|t| (t.size.clone(), t.average_ticket))
                    .collect(),
                colors: vec![GOLD],
            },
            ChartData {
                id: "basket_distribution",
                title: "Pizzas per Order".into(),
                x_label: "Pizzas in Order",
                y_label: "Orders",
                kind: ChartKind::VerticalBar,
                points: dashboard
                    .basket_distribution
                    .iter()
                    .map(|b| (b.basket_size.to_string(), b.orders as f64))
                    .collect(),
                colors: vec![GOLD],
            },
            ChartData {
                id: "price_by_size",
                title: "Average Unit Price by Size".into(),
                x_label: "Size",
                y_label: "Average Unit Price ($)",
                kind: ChartKind::VerticalBar,
                points: dashboard
                    .price_by_size
                    .iter()
                    .map(|p| (p.size.clone(), p.average_unit_price))
                    .collect(),
                colors: vec![GOLD],
            },
            ChartData {
                id: "price_simulation",
                title: format!("{} Revenue: +{}% Price", sim.size, sim.increase_pct),
                x_label: "Revenue ($)",
                y_label: "",
                kind: ChartKind::HorizontalBar,
                points: vec![
                    ("Current".to_string(), sim.current_revenue),
                    ("Simulated".to_string(), sim.projected_revenue),
                ],
                colors: vec![SLATE, GAIN],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_table;
    use crate::stats::DashboardOptions;

    #[test]
    fn dashboard_yields_ten_charts() {
        let table = fixture_table();
        let dashboard = Dashboard::compute(table.frame(), &DashboardOptions::default()).unwrap();
        let charts = ChartData::from_dashboard(&dashboard);

        assert_eq!(charts.len(), 10);
        let mut ids: Vec<&str> = charts.iter().map(|c| c.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);

        let weekly = charts.iter().find(|c| c.id == "weekly_demand").unwrap();
        assert_eq!(weekly.points.len(), 7);
        assert_eq!(weekly.max_value(), 4.0);
    }

    #[test]
    fn colours_cycle_or_repeat() {
        let chart = ChartData {
            id: "t",
            title: String::new(),
            x_label: "",
            y_label: "",
            kind: ChartKind::VerticalBar,
            points: Vec::new(),
            colors: vec![SLATE, GAIN],
        };
        assert_eq!(chart.color_for(0), SLATE);
        assert_eq!(chart.color_for(3), GAIN);
        assert_eq!(ChartData { colors: vec![], ..chart }.color_for(5), GOLD);
    }
}
