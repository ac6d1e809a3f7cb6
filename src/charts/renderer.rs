//! Static Chart Renderer
//! Draws dashboard charts to PNG files with plotters.
//!
//! Every chart gets its own image: caption on top, bars, line or donut below.
//! Category labels sit on segmented axes so they line up with the bars.

use super::{ChartData, ChartKind};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

const FONT: &str = "sans-serif";
const CAPTION_SIZE: u32 = 28;
const LABEL_SIZE: u32 = 16;
/// Empty space added above the tallest bar.
const HEADROOM: f64 = 1.1;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("image size must be non-zero, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("failed to draw chart '{chart}': {message}")]
    Draw { chart: String, message: String },
}

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn rgb(color: [u8; 3]) -> RGBColor {
    RGBColor(color[0], color[1], color[2])
}

/// Value axis from zero to just above the largest point.
fn value_range(chart: &ChartData) -> Range<f64> {
    let max = chart.max_value();
    if max > 0.0 {
        0.0..max * HEADROOM
    } else {
        0.0..1.0
    }
}

/// Label of the segment centred on `value`; blank on segment edges.
fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Renders charts as PNG images.
pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Draw `chart` into a `width` x `height` PNG at `path`.
    pub fn render_png(
        chart: &ChartData,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }

        let draw_error = |err: &dyn std::fmt::Display| RenderError::Draw {
            chart: chart.id.to_string(),
            message: err.to_string(),
        };

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_error(&e))?;

        let result = if chart.points.is_empty() {
            Self::draw_placeholder(&root, chart)
        } else {
            match chart.kind {
                ChartKind::HorizontalBar => Self::draw_horizontal_bars(&root, chart),
                ChartKind::VerticalBar => Self::draw_vertical_bars(&root, chart),
                ChartKind::Line => Self::draw_line(&root, chart),
                ChartKind::Donut => Self::draw_donut(&root, chart),
            }
        };
        result.map_err(|e| draw_error(&e))?;

        root.present().map_err(|e| draw_error(&e))?;
        Ok(())
    }

    fn draw_placeholder<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
    ) -> DrawResult<DB> {
        let body = root.titled(&chart.title, (FONT, CAPTION_SIZE))?;
        let (w, h) = body.dim_in_pixel();
        let grey = BLACK.mix(0.5);
        let style = TextStyle::from((FONT, 20).into_font())
            .color(&grey)
            .pos(Pos::new(HPos::Center, VPos::Center));
        body.draw(&Text::new(
            "No data for this selection",
            (w as i32 / 2, h as i32 / 2),
            style,
        ))
    }

    fn draw_vertical_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
    ) -> DrawResult<DB> {
        let labels: Vec<String> = chart.points.iter().map(|(l, _)| l.clone()).collect();
        let n = chart.points.len();

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), value_range(chart))?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|v| segment_label(&labels, v))
            .x_desc(chart.x_label)
            .y_desc(chart.y_label)
            .label_style((FONT, LABEL_SIZE))
            .draw()?;

        ctx.draw_series(chart.points.iter().enumerate().map(|(i, (_, value))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), *value),
                ],
                rgb(chart.color_for(i)).filled(),
            );
            bar.set_margin(0, 0, 8, 8);
            bar
        }))?;

        Ok(())
    }

    /// Rankings read top-down, so the first point is drawn on the top row.
    fn draw_horizontal_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
    ) -> DrawResult<DB> {
        let n = chart.points.len();
        let labels: Vec<String> = chart.points.iter().rev().map(|(l, _)| l.clone()).collect();

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(170)
            .build_cartesian_2d(value_range(chart), (0..n).into_segmented())?;

        ctx.configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|v| segment_label(&labels, v))
            .x_desc(chart.x_label)
            .label_style((FONT, LABEL_SIZE))
            .draw()?;

        ctx.draw_series(chart.points.iter().enumerate().map(|(i, (_, value))| {
            let row = n - 1 - i;
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (*value, SegmentValue::Exact(row + 1)),
                ],
                rgb(chart.color_for(i)).filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))?;

        Ok(())
    }

    fn draw_line<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
    ) -> DrawResult<DB> {
        let color = rgb(chart.color_for(0));
        let coords: Vec<(f64, f64)> = chart
            .points
            .iter()
            .enumerate()
            .map(|(i, (label, value))| (label.parse::<f64>().unwrap_or(i as f64), *value))
            .collect();

        let x_min = coords.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
        let x_max = coords.iter().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d((x_min - 0.5)..(x_max + 0.5), value_range(chart))?;

        ctx.configure_mesh()
            .x_labels(coords.len().max(2))
            .x_label_formatter(&|x| format!("{:.0}", x))
            .x_desc(chart.x_label)
            .y_desc(chart.y_label)
            .label_style((FONT, LABEL_SIZE))
            .draw()?;

        ctx.draw_series(LineSeries::new(coords.clone(), color.stroke_width(3)))?;
        ctx.draw_series(
            coords
                .into_iter()
                .map(|point| Circle::new(point, 5, color.filled())),
        )?;

        Ok(())
    }

    fn draw_donut<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
    ) -> DrawResult<DB> {
        let sizes: Vec<f64> = chart.points.iter().map(|(_, v)| v.max(0.0)).collect();
        if sizes.iter().sum::<f64>() <= 0.0 {
            return Self::draw_placeholder(root, chart);
        }
        let body = root.titled(&chart.title, (FONT, CAPTION_SIZE))?;

        let labels: Vec<String> = chart.points.iter().map(|(l, _)| l.clone()).collect();
        let colors: Vec<RGBColor> = (0..sizes.len()).map(|i| rgb(chart.color_for(i))).collect();

        let (w, h) = body.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.38;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.donut_hole(radius * 0.4);
        pie.label_style((FONT, LABEL_SIZE + 2).into_font().color(&BLACK));
        pie.percentages((FONT, LABEL_SIZE).into_font().color(&BLACK));
        body.draw(&pie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::GOLD;

    fn chart(points: Vec<(String, f64)>) -> ChartData {
        ChartData {
            id: "test",
            title: "Test".into(),
            x_label: "",
            y_label: "",
            kind: ChartKind::VerticalBar,
            points,
            colors: vec![GOLD],
        }
    }

    #[test]
    fn value_axis_has_headroom() {
        let range = value_range(&chart(vec![("a".into(), 10.0), ("b".into(), 4.0)]));
        assert_eq!(range.start, 0.0);
        assert!((range.end - 11.0).abs() < 1e-9);
    }

    #[test]
    fn empty_chart_still_gets_an_axis() {
        assert_eq!(value_range(&chart(Vec::new())), 0.0..1.0);
    }

    #[test]
    fn labels_only_at_segment_centres() {
        let labels = vec!["Mon".to_string(), "Tue".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "Tue");
        assert_eq!(segment_label(&labels, &SegmentValue::Exact(1)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(5)), "");
    }

    #[test]
    fn empty_or_zero_sum_chart_renders_a_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.png");
        StaticChartRenderer::render_png(&chart(Vec::new()), &empty, 400, 300).unwrap();
        assert!(std::fs::metadata(&empty).unwrap().len() > 0);

        let donut = ChartData {
            kind: ChartKind::Donut,
            ..chart(vec![("S".into(), 0.0), ("M".into(), 0.0)])
        };
        let zero = dir.path().join("zero.png");
        StaticChartRenderer::render_png(&donut, &zero, 400, 300).unwrap();
        assert!(zero.is_file());
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticChartRenderer::render_png(
            &chart(Vec::new()),
            &dir.path().join("x.png"),
            0,
            300,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::InvalidSize { width: 0, .. }));
    }
}
