//! Export Module
//! Writes the dashboard to disk: one PNG per chart plus a JSON snapshot.

use crate::charts::{ChartData, RenderError, StaticChartRenderer};
use crate::config::DashboardConfig;
use crate::data::{FilterSelection, LoadReport};
use crate::stats::Dashboard;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const CHART_WIDTH: u32 = 1200;
pub const CHART_HEIGHT: u32 = 700;
pub const SNAPSHOT_FILE: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot create export folder {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything needed to reproduce one dashboard view.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot<'a> {
    pub config: &'a DashboardConfig,
    pub load_report: &'a LoadReport,
    pub selection: &'a FilterSelection,
    pub dashboard: &'a Dashboard,
}

/// Files written by one export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub charts: Vec<PathBuf>,
    pub snapshot: PathBuf,
}

pub struct ReportExporter;

impl ReportExporter {
    /// Render every chart and write the snapshot into `dir`, creating it if needed.
    pub fn export(dir: &Path, snapshot: &DashboardSnapshot) -> Result<ExportSummary, ExportError> {
        Self::ensure_dir(dir)?;

        let charts = ChartData::from_dashboard(snapshot.dashboard);
        let chart_paths = Self::export_charts_as_png(&charts, dir)?;
        let snapshot_path = Self::write_snapshot(dir, snapshot)?;

        info!(
            "Exported {} charts and {} to {}",
            chart_paths.len(),
            SNAPSHOT_FILE,
            dir.display()
        );
        Ok(ExportSummary {
            charts: chart_paths,
            snapshot: snapshot_path,
        })
    }

    /// `NN_<chart id>.png`, numbered in display order.
    pub fn chart_file_name(index: usize, chart: &ChartData) -> String {
        format!("{:02}_{}.png", index + 1, chart.id)
    }

    pub fn export_charts_as_png(
        charts: &[ChartData],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let mut paths = Vec::with_capacity(charts.len());
        for (index, chart) in charts.iter().enumerate() {
            let path = dir.join(Self::chart_file_name(index, chart));
            StaticChartRenderer::render_png(chart, &path, CHART_WIDTH, CHART_HEIGHT)?;
            debug!("Wrote {}", path.display());
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn write_snapshot(dir: &Path, snapshot: &DashboardSnapshot) -> Result<PathBuf, ExportError> {
        let path = dir.join(SNAPSHOT_FILE);
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn ensure_dir(dir: &Path) -> Result<(), ExportError> {
        fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }
}
