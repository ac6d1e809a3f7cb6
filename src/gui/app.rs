//! Pizzeria Dashboard Main Application
//! Main window with control panel and dashboard viewer.

use crate::config::DashboardConfig;
use crate::data::{DataLoader, FilterSelection, LoadReport, LoadedData, SalesTable};
use crate::export::{DashboardSnapshot, ReportExporter};
use crate::gui::control_panel::SourceFile;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::Dashboard;
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete(LoadedData),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    table: Option<SalesTable>,
    report: LoadReport,
    selection: Option<FilterSelection>,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(&config),
            chart_viewer: ChartViewer::new(),
            config,
            table: None,
            report: LoadReport::default(),
            selection: None,
            load_rx: None,
            is_loading: false,
        };
        app.start_load();
        app
    }

    /// Load both CSV files in a background thread.
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        self.config.sales_path = self.control_panel.sales_path.clone();
        self.config.types_path = self.control_panel.types_path.clone();
        self.table = None;
        self.selection = None;
        self.chart_viewer.clear();
        self.control_panel.clear_report();
        self.control_panel.export_enabled = false;
        self.control_panel.is_busy = true;
        self.control_panel.set_status("Loading CSV files...");
        self.is_loading = true;

        info!(
            "Loading {} and {}",
            self.config.sales_path.display(),
            self.config.types_path.display()
        );
        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let loader = DataLoader::new(self.config.load_options());
        let sales_path = self.config.sales_path.clone();
        let types_path = self.config.types_path.clone();

        thread::spawn(move || {
            let result = match loader.load(&sales_path, &types_path) {
                Ok(loaded) => LoadResult::Complete(loaded),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(LoadedData { table, report })) => {
                self.control_panel
                    .reset_filters(table.categories(), table.date_span());
                self.control_panel.set_report(&report);
                self.report = report;
                self.table = Some(table);
                self.finish_loading();
                self.refresh_dashboard();
            }
            Ok(LoadResult::Error(message)) => {
                error!("Load failed: {}", message);
                self.finish_loading();
                self.control_panel.set_status(&format!("Error: {}", message));
            }
            Err(TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                error!("Loader thread exited without a result");
                self.finish_loading();
                self.control_panel.set_status("Error: loading stopped unexpectedly");
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.is_busy = false;
    }

    /// Re-run every query for the current filter choice.
    fn refresh_dashboard(&mut self) {
        let Some(table) = &self.table else {
            return;
        };

        let selection = match self.control_panel.selection() {
            Ok(selection) => selection,
            Err(message) => {
                self.invalidate_dashboard();
                self.control_panel.set_status(&format!("Error: {}", message));
                return;
            }
        };

        self.config.basket = self.control_panel.basket;
        self.config.increase = self.control_panel.price_increase();

        let result = selection
            .apply(table)
            .map_err(|e| e.to_string())
            .and_then(|filtered| {
                Dashboard::compute(&filtered, &self.config.dashboard_options())
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(dashboard) => {
                self.control_panel.set_status(&format!(
                    "{} of {} rows selected",
                    dashboard.rows,
                    table.row_count()
                ));
                self.control_panel.export_enabled = true;
                self.chart_viewer.set_dashboard(dashboard);
                self.selection = Some(selection);
            }
            Err(message) => {
                error!("Dashboard query failed: {}", message);
                self.invalidate_dashboard();
                self.control_panel.set_status(&format!("Error: {}", message));
            }
        }
    }

    /// Charts no longer describe the filter inputs; drop them so they cannot be exported.
    fn invalidate_dashboard(&mut self) {
        self.chart_viewer.clear();
        self.selection = None;
        self.control_panel.export_enabled = false;
    }

    fn handle_increase_changed(&mut self) {
        let increase = self.control_panel.price_increase();
        self.config.increase = increase;
        self.chart_viewer.resimulate(increase);
    }

    fn handle_browse(&mut self, source: SourceFile) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            match source {
                SourceFile::Sales => self.control_panel.sales_path = path,
                SourceFile::Types => self.control_panel.types_path = path,
            }
            self.start_load();
        }
    }

    /// Render charts and the snapshot into a user-picked folder, then open it.
    fn handle_export(&mut self) {
        let (Some(dashboard), Some(selection)) = (self.chart_viewer.dashboard(), &self.selection)
        else {
            self.control_panel.set_status("No dashboard to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let mut config = self.config.clone();
        config.export_dir = Some(dir.clone());
        let snapshot = DashboardSnapshot {
            config: &config,
            load_report: &self.report,
            selection,
            dashboard,
        };

        match ReportExporter::export(&dir, &snapshot) {
            Ok(summary) => {
                let status = format!("Exported {} charts", summary.charts.len());
                self.control_panel.set_status(&status);
                if let Err(e) = open::that(&dir) {
                    warn!("Could not open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                error!("Export failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::Browse(source) => self.handle_browse(source),
                        ControlPanelAction::Reload => self.start_load(),
                        ControlPanelAction::FiltersChanged => self.refresh_dashboard(),
                        ControlPanelAction::IncreaseChanged => self.handle_increase_changed(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::fixture_table;

    fn loaded_app() -> DashboardApp {
        let config = DashboardConfig::default();
        let table = fixture_table();
        let mut control_panel = ControlPanel::new(&config);
        control_panel.reset_filters(table.categories(), table.date_span());
        DashboardApp {
            config,
            control_panel,
            chart_viewer: ChartViewer::new(),
            table: Some(table),
            report: LoadReport::default(),
            selection: None,
            load_rx: None,
            is_loading: false,
        }
    }

    #[test]
    fn refresh_fills_viewer_and_enables_export() {
        let mut app = loaded_app();
        app.refresh_dashboard();
        assert!(app.chart_viewer.dashboard().is_some());
        assert!(app.selection.is_some());
        assert!(app.control_panel.export_enabled);
    }

    #[test]
    fn bad_date_clears_the_previous_dashboard() {
        let mut app = loaded_app();
        app.refresh_dashboard();
        assert!(app.chart_viewer.dashboard().is_some());

        app.control_panel.end_text = "soon".into();
        app.refresh_dashboard();
        assert!(app.chart_viewer.dashboard().is_none());
        assert!(app.selection.is_none());
        assert!(!app.control_panel.export_enabled);
        assert!(app.control_panel.status.starts_with("Error:"));
    }
}
