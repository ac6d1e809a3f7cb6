//! Pizzeria Dashboard - Sales analytics over pizza order CSVs
//!
//! Opens an interactive dashboard window, or with `--export` renders every
//! chart and a JSON snapshot to a folder and exits.

mod charts;
mod config;
mod data;
mod export;
mod gui;
mod stats;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use config::{DashboardConfig, DEFAULT_SALES_PATH, DEFAULT_TYPES_PATH};
use data::{DataLoader, FilterSelection, UnmatchedPolicy};
use eframe::egui;
use export::{DashboardSnapshot, ReportExporter};
use gui::DashboardApp;
use stats::{BasketMeasure, Dashboard, PriceIncrease, DEFAULT_INCREASE_PCT};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI-compatible unmatched-row policy
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliUnmatched {
    /// Leave out sales whose pizza type is not on the menu
    Drop,
    /// Keep them with "Unknown" name, category and size
    Impute,
}

impl From<CliUnmatched> for UnmatchedPolicy {
    fn from(cli: CliUnmatched) -> Self {
        match cli {
            CliUnmatched::Drop => UnmatchedPolicy::Drop,
            CliUnmatched::Impute => UnmatchedPolicy::Impute,
        }
    }
}

/// CLI-compatible basket measure
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBasket {
    /// Pizzas per order (sum of quantities)
    TotalQuantity,
    /// Distinct menu items per order
    DistinctLines,
}

impl From<CliBasket> for BasketMeasure {
    fn from(cli: CliBasket) -> Self {
        match cli {
            CliBasket::TotalQuantity => BasketMeasure::TotalQuantity,
            CliBasket::DistinctLines => BasketMeasure::DistinctLines,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Pizzeria sales dashboard")]
struct Args {
    /// Order lines CSV (order_id, pizza_name_id, quantity, unit_price, order_date, order_time)
    #[arg(long, default_value = DEFAULT_SALES_PATH)]
    sales: PathBuf,

    /// Menu CSV (pizza_type_id, pizza_name, pizza_category, pizza_size)
    #[arg(long, default_value = DEFAULT_TYPES_PATH)]
    types: PathBuf,

    /// What to do with sales whose pizza type is missing from the menu
    #[arg(long, value_enum, default_value_t = CliUnmatched::Drop)]
    unmatched: CliUnmatched,

    /// How the pizzas-per-order histogram counts an order
    #[arg(long, value_enum, default_value_t = CliBasket::TotalQuantity)]
    basket: CliBasket,

    /// XL price increase to simulate, in percent
    #[arg(
        long,
        default_value_t = u32::from(DEFAULT_INCREASE_PCT),
        value_parser = clap::value_parser!(u32).range(0..=50)
    )]
    increase: u32,

    /// Write PNG charts and dashboard.json to this folder instead of opening a window
    #[arg(long)]
    export: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Result<DashboardConfig> {
        Ok(DashboardConfig {
            sales_path: self.sales,
            types_path: self.types,
            unmatched: self.unmatched.into(),
            basket: self.basket.into(),
            increase: PriceIncrease::new(self.increase)?,
            export_dir: self.export,
        })
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Headless mode: load, compute the default view, write files.
fn run_export(config: &DashboardConfig, dir: &Path) -> Result<()> {
    let loaded = DataLoader::new(config.load_options())
        .load(&config.sales_path, &config.types_path)
        .context("Failed to load sales data")?;

    if !loaded.report.is_clean() {
        warn!(
            "{} field(s) could not be parsed, {} sale(s) had no pizza type",
            loaded.report.issues.len(),
            loaded.report.unmatched_rows
        );
    }

    let selection = FilterSelection::everything(&loaded.table);
    let filtered = selection
        .apply(&loaded.table)
        .context("Failed to filter sales")?;
    let dashboard = Dashboard::compute(&filtered, &config.dashboard_options())
        .context("Failed to compute dashboard")?;

    let summary = ReportExporter::export(
        dir,
        &DashboardSnapshot {
            config,
            load_report: &loaded.report,
            selection: &selection,
            dashboard: &dashboard,
        },
    )
    .context("Export failed")?;

    info!(
        "Wrote {} charts and {}",
        summary.charts.len(),
        summary.snapshot.display()
    );
    Ok(())
}

fn run_gui(config: DashboardConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Pizzeria Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Pizzeria Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("Window error: {}", e))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.into_config()?;
    match config.export_dir.clone() {
        Some(dir) => run_export(&config, &dir),
        None => run_gui(config),
    }
}
