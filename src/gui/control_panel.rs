//! Control Panel Widget
//! Left side panel with data sources, filters and the price slider.

use crate::config::DashboardConfig;
use crate::data::{DateRange, FilterSelection, LoadReport};
use crate::stats::{BasketMeasure, PriceIncrease, MAX_INCREASE_PCT};
use chrono::NaiveDate;
use egui::{Color32, RichText, ScrollArea};
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";
/// Issues listed individually under the load summary.
const MAX_LISTED_ISSUES: usize = 20;

/// Which input file a browse button replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFile {
    Sales,
    Types,
}

/// Parse a `YYYY-MM-DD` field; blank means "not set".
pub fn parse_date_input(text: &str) -> Result<Option<NaiveDate>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("'{}' is not a YYYY-MM-DD date", text))
}

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub sales_path: PathBuf,
    pub types_path: PathBuf,
    pub categories: Vec<(String, bool)>,
    pub start_text: String,
    pub end_text: String,
    /// Unchecked leaves the picker half-filled: only the start date is set.
    pub use_end_date: bool,
    pub increase_pct: u8,
    pub basket: BasketMeasure,
    pub report_lines: Vec<String>,
    pub issue_lines: Vec<String>,
    pub status: String,
    pub is_busy: bool,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            sales_path: config.sales_path.clone(),
            types_path: config.types_path.clone(),
            categories: Vec::new(),
            start_text: String::new(),
            end_text: String::new(),
            use_end_date: true,
            increase_pct: config.increase.percent(),
            basket: config.basket,
            report_lines: Vec::new(),
            issue_lines: Vec::new(),
            status: "Ready".to_string(),
            is_busy: false,
            export_enabled: false,
        }
    }

    /// Reset filters to every category over the full date span.
    pub fn reset_filters(&mut self, categories: &[String], span: Option<(NaiveDate, NaiveDate)>) {
        self.categories = categories.iter().map(|c| (c.clone(), true)).collect();
        match span {
            Some((first, last)) => {
                self.start_text = first.format(DATE_FORMAT).to_string();
                self.end_text = last.format(DATE_FORMAT).to_string();
            }
            None => {
                self.start_text.clear();
                self.end_text.clear();
            }
        }
        self.use_end_date = true;
    }

    pub fn set_report(&mut self, report: &LoadReport) {
        let mut lines = vec![
            format!("Rows read: {}", report.rows_read),
            format!("Rows loaded: {}", report.rows_loaded),
        ];
        if report.unmatched_rows > 0 {
            lines.push(format!("Rows without pizza type: {}", report.unmatched_rows));
        }
        if !report.duplicate_type_ids.is_empty() {
            lines.push(format!(
                "Duplicate type ids: {}",
                report.duplicate_type_ids.join(", ")
            ));
        }
        for (column, count) in report.issues_by_column() {
            lines.push(format!("Unparsed {}: {}", column, count));
        }
        self.report_lines = lines;
        self.issue_lines = report
            .issues
            .iter()
            .take(MAX_LISTED_ISSUES)
            .map(|issue| issue.to_string())
            .collect();
    }

    pub fn clear_report(&mut self) {
        self.report_lines.clear();
        self.issue_lines.clear();
        self.categories.clear();
    }

    /// Current category and date choice.
    pub fn selection(&self) -> Result<FilterSelection, String> {
        let start = parse_date_input(&self.start_text)?;
        let end = if self.use_end_date {
            parse_date_input(&self.end_text)?
        } else {
            None
        };

        let categories = self
            .categories
            .iter()
            .filter(|(_, selected)| *selected)
            .map(|(name, _)| name.clone());
        Ok(FilterSelection::new(
            categories,
            DateRange::from_bounds(start, end),
        ))
    }

    pub fn price_increase(&self) -> PriceIncrease {
        PriceIncrease::new(u32::from(self.increase_pct)).unwrap_or_default()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🍕 Pizzeria Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(0xFF, 0xC3, 0x00)),
            );
            ui.label(RichText::new("Sales Analytics").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                for (label, source) in [("Sales", SourceFile::Sales), ("Types", SourceFile::Types)] {
                    let path = match source {
                        SourceFile::Sales => &self.sales_path,
                        SourceFile::Types => &self.types_path,
                    };
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.horizontal(|ui| {
                        ui.label(RichText::new(format!("{}:", label)).size(12.0).strong());
                        ui.label(RichText::new(file_name).size(12.0));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("📂 Browse").clicked() {
                                action = ControlPanelAction::Browse(source);
                            }
                        });
                    });
                }

                ui.add_space(4.0);
                ui.add_enabled_ui(!self.is_busy, |ui| {
                    if ui.button("🔄 Reload").clicked() {
                        action = ControlPanelAction::Reload;
                    }
                });
            });

        if !self.report_lines.is_empty() {
            ui.add_space(5.0);
            for line in &self.report_lines {
                ui.label(RichText::new(line).size(11.0).color(Color32::GRAY));
            }
            if !self.issue_lines.is_empty() {
                egui::CollapsingHeader::new("Parse issues")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
                            for line in &self.issue_lines {
                                ui.label(RichText::new(line).size(10.0));
                            }
                        });
                    });
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Category Filter Section =====
        ui.label(RichText::new("🏷 Categories").size(14.0).strong());
        ui.add_space(5.0);

        let mut filters_changed = false;
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(140.0).show(ui, |ui| {
                    for (name, selected) in self.categories.iter_mut() {
                        filters_changed |= ui.checkbox(selected, name.as_str()).changed();
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.categories.iter_mut().for_each(|(_, v)| *v = true);
                filters_changed = true;
            }
            if ui.small_button("Clear All").clicked() {
                self.categories.iter_mut().for_each(|(_, v)| *v = false);
                filters_changed = true;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Date Range Section =====
        ui.label(RichText::new("📅 Order Dates").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 60.0;
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("From:"));
            filters_changed |= ui
                .add(egui::TextEdit::singleline(&mut self.start_text).desired_width(110.0))
                .lost_focus();
        });
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            filters_changed |= ui.checkbox(&mut self.use_end_date, "To:").changed();
            ui.add_enabled_ui(self.use_end_date, |ui| {
                filters_changed |= ui
                    .add(egui::TextEdit::singleline(&mut self.end_text).desired_width(110.0))
                    .lost_focus();
            });
        });
        if let Err(message) = self.selection() {
            ui.label(
                RichText::new(message)
                    .size(11.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Basket Measure Section =====
        ui.label(RichText::new("🧺 Basket Size").size(14.0).strong());
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            filters_changed |= ui
                .radio_value(&mut self.basket, BasketMeasure::TotalQuantity, "Pizzas")
                .changed();
            filters_changed |= ui
                .radio_value(&mut self.basket, BasketMeasure::DistinctLines, "Distinct items")
                .changed();
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Price Simulator Section =====
        ui.label(RichText::new("💲 XL Price Increase").size(14.0).strong());
        ui.add_space(5.0);
        let slider = egui::Slider::new(&mut self.increase_pct, 0..=MAX_INCREASE_PCT).suffix("%");
        if ui.add(slider).changed() {
            action = ControlPanelAction::IncreaseChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !self.is_busy, |ui| {
                let export_button = egui::Button::new(RichText::new("🖼 Export Charts").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(export_button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(10.0);

        if self.is_busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(&self.status).size(11.0));
            });
        } else {
            let status_color = if self.status.starts_with("Error") {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        }

        if filters_changed && action == ControlPanelAction::None {
            action = ControlPanelAction::FiltersChanged;
        }
        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Browse(SourceFile),
    Reload,
    FiltersChanged,
    IncreaseChanged,
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_table;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn panel() -> ControlPanel {
        let table = fixture_table();
        let mut panel = ControlPanel::new(&DashboardConfig::default());
        panel.reset_filters(table.categories(), table.date_span());
        panel
    }

    #[test]
    fn date_inputs_accept_iso_or_blank() {
        assert_eq!(parse_date_input(" 2015-01-06 "), Ok(Some(date(2015, 1, 6))));
        assert_eq!(parse_date_input(""), Ok(None));
        assert!(parse_date_input("06/01/2015").is_err());
    }

    #[test]
    fn reset_selects_everything_over_full_span() {
        let panel = panel();
        let selection = panel.selection().unwrap();
        assert_eq!(selection.categories.len(), 4);
        assert_eq!(
            selection.dates,
            DateRange::Range(date(2015, 1, 1), date(2015, 1, 6))
        );
    }

    #[test]
    fn unchecked_end_date_gives_single_date() {
        let mut panel = panel();
        panel.use_end_date = false;
        assert_eq!(
            panel.selection().unwrap().dates,
            DateRange::SingleDate(date(2015, 1, 1))
        );
    }

    #[test]
    fn deselected_categories_are_left_out() {
        let mut panel = panel();
        panel.categories.iter_mut().for_each(|(_, v)| *v = false);
        panel.categories[0].1 = true;
        let selection = panel.selection().unwrap();
        assert_eq!(selection.categories.len(), 1);
        assert!(selection.categories.contains("Chicken"));
    }

    #[test]
    fn bad_date_blocks_the_selection() {
        let mut panel = panel();
        panel.end_text = "soon".into();
        assert!(panel.selection().is_err());
    }

    #[test]
    fn report_summary_lists_problems() {
        let report = LoadReport {
            rows_read: 10,
            rows_loaded: 9,
            unmatched_rows: 1,
            duplicate_type_ids: vec!["bbq_ckn".into()],
            issues: Vec::new(),
        };
        let mut panel = panel();
        panel.set_report(&report);
        assert!(panel.report_lines.contains(&"Rows without pizza type: 1".to_string()));
        assert!(panel.report_lines.contains(&"Duplicate type ids: bbq_ckn".to_string()));
        assert!(panel.issue_lines.is_empty());
    }

    #[test]
    fn slider_value_maps_to_increase() {
        let mut panel = panel();
        panel.increase_pct = 30;
        assert_eq!(panel.price_increase().percent(), 30);
    }
}
