//! Chart Viewer Widget
//! Right side scrollable panel: KPI cards, the simulator summary and every
//! dashboard chart in a responsive multi-column grid.

use crate::charts::{ChartData, ChartPlotter};
use crate::stats::{Dashboard, PriceIncrease};
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const CARD_HEIGHT: f32 = 320.0;
/// Narrowest a chart card gets before the grid drops a column.
const CHART_MIN_WIDTH: f32 = 520.0;
const MAX_COLUMNS: usize = 2;

/// `$1,234.56`
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

/// `12,345`
pub fn format_count(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(value.unsigned_abs()))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Scrollable dashboard display area.
#[derive(Default)]
pub struct ChartViewer {
    dashboard: Option<Dashboard>,
    charts: Vec<ChartData>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.dashboard = None;
        self.charts.clear();
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn set_dashboard(&mut self, dashboard: Dashboard) {
        self.charts = ChartData::from_dashboard(&dashboard);
        self.dashboard = Some(dashboard);
    }

    /// Update only the simulation; the rest of the dashboard is unchanged.
    pub fn resimulate(&mut self, increase: PriceIncrease) {
        if let Some(mut dashboard) = self.dashboard.take() {
            dashboard.resimulate(increase);
            self.set_dashboard(dashboard);
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(dashboard) = &self.dashboard else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let avail_width = ui.available_width();
        let num_columns = ((avail_width / (CHART_MIN_WIDTH + CHART_SPACING)).floor() as usize)
            .clamp(1, MAX_COLUMNS);
        let card_width =
            (avail_width - CHART_SPACING * num_columns as f32) / num_columns as f32 - 24.0;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::draw_kpi_row(ui, dashboard);
                ui.add_space(CHART_SPACING);

                if dashboard.rows == 0 {
                    ui.label(
                        RichText::new("No rows match the current filters")
                            .size(14.0)
                            .color(Color32::GRAY),
                    );
                    ui.add_space(CHART_SPACING);
                }

                for row in self.charts.chunks(num_columns) {
                    ui.horizontal(|ui| {
                        for chart in row {
                            Self::draw_chart_card(ui, chart, card_width);
                            ui.add_space(CHART_SPACING);
                        }
                    });
                    ui.add_space(CHART_SPACING);
                }

                Self::draw_simulation_row(ui, dashboard);
            });
    }

    fn draw_kpi_row(ui: &mut egui::Ui, dashboard: &Dashboard) {
        let kpis = &dashboard.kpis;
        ui.horizontal(|ui| {
            Self::draw_metric_card(ui, "Total Revenue", &format_money(kpis.total_revenue), None);
            Self::draw_metric_card(ui, "Pizzas Sold", &format_count(kpis.total_pizzas), None);
            Self::draw_metric_card(ui, "Orders", &format_count(kpis.unique_orders as i64), None);
            Self::draw_metric_card(ui, "Average Ticket", &format_money(kpis.average_ticket), None);
        });
    }

    fn draw_simulation_row(ui: &mut egui::Ui, dashboard: &Dashboard) {
        let sim = &dashboard.simulation;
        ui.label(
            RichText::new(format!("{} Price Simulation (+{}%)", sim.size, sim.increase_pct))
                .size(18.0)
                .strong(),
        );
        ui.add_space(8.0);
        let gain_color = if sim.net_gain > 0.0 {
            Color32::from_rgb(0x00, 0xC8, 0x51)
        } else {
            Color32::GRAY
        };
        ui.horizontal(|ui| {
            Self::draw_metric_card(ui, "Current Price", &format_money(sim.current_price), None);
            Self::draw_metric_card(ui, "Simulated Price", &format_money(sim.simulated_price), None);
            Self::draw_metric_card(
                ui,
                "Projected Revenue",
                &format_money(sim.projected_revenue),
                None,
            );
            Self::draw_metric_card(ui, "Net Gain", &format_money(sim.net_gain), Some(gain_color));
        });
        ui.add_space(CHART_SPACING);
    }

    fn draw_metric_card(ui: &mut egui::Ui, title: &str, value: &str, color: Option<Color32>) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_rgb(0xFF, 0xC3, 0x00)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_min_width(170.0);
                ui.vertical(|ui| {
                    ui.label(RichText::new(title).size(12.0).color(Color32::GRAY));
                    let mut text = RichText::new(value).size(22.0).strong();
                    if let Some(color) = color {
                        text = text.color(color);
                    }
                    ui.label(text);
                });
            });
    }

    fn draw_chart_card(ui: &mut egui::Ui, chart: &ChartData, card_width: f32) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(card_width);
                ui.vertical(|ui| {
                    ui.label(RichText::new(&chart.title).size(16.0).strong());
                    ui.add_space(6.0);
                    ChartPlotter::draw_chart(ui, chart, CARD_HEIGHT);
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_table;
    use crate::stats::DashboardOptions;

    #[test]
    fn money_is_grouped_with_two_decimals() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(239.2), "$239.20");
        assert_eq!(format_money(817860.05), "$817,860.05");
        assert_eq!(format_money(-11.25), "-$11.25");
    }

    #[test]
    fn counts_are_grouped() {
        assert_eq!(format_count(13), "13");
        assert_eq!(format_count(49574), "49,574");
        assert_eq!(format_count(1_000_000), "1,000,000");
    }

    #[test]
    fn resimulate_refreshes_the_simulation_chart() {
        let table = fixture_table();
        let dashboard = Dashboard::compute(table.frame(), &DashboardOptions::default()).unwrap();
        let mut viewer = ChartViewer::new();
        viewer.set_dashboard(dashboard);

        viewer.resimulate(PriceIncrease::new(0).unwrap());
        let sim_chart = viewer.charts.iter().find(|c| c.id == "price_simulation").unwrap();
        assert_eq!(sim_chart.points[0].1, sim_chart.points[1].1);
        assert_eq!(viewer.dashboard().unwrap().simulation.increase_pct, 0);
    }

    #[test]
    fn clear_drops_everything() {
        let table = fixture_table();
        let dashboard = Dashboard::compute(table.frame(), &DashboardOptions::default()).unwrap();
        let mut viewer = ChartViewer::new();
        viewer.set_dashboard(dashboard);
        viewer.clear();
        assert!(viewer.dashboard().is_none());
        assert!(viewer.charts.is_empty());
    }
}
