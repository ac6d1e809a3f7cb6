//! Chart Plotter Module
//! Draws dashboard charts interactively using egui_plot.

use super::{ChartData, ChartKind};
use egui::{Align2, Color32, FontId, Pos2, RichText, Shape, Stroke};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, Points};
use std::f32::consts::{FRAC_PI_2, TAU};
use std::ops::RangeInclusive;

/// Donut hole as a fraction of the outer radius.
const DONUT_HOLE: f32 = 0.4;
/// Angular step used to approximate donut arcs.
const ARC_STEP: f32 = 0.05;

pub fn to_color32(rgb: [u8; 3]) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Axis formatter showing a point's label at integer positions only.
fn label_formatter(
    labels: Vec<String>,
) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String + 'static {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// Creates interactive dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw a chart of any kind at the given height.
    pub fn draw_chart(ui: &mut egui::Ui, chart: &ChartData, height: f32) {
        if chart.points.is_empty() {
            ui.allocate_ui(egui::vec2(ui.available_width(), height), |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No data for this selection").color(Color32::GRAY));
                });
            });
            return;
        }

        match chart.kind {
            ChartKind::HorizontalBar => Self::draw_bar_chart(ui, chart, height, true),
            ChartKind::VerticalBar => Self::draw_bar_chart(ui, chart, height, false),
            ChartKind::Line => Self::draw_line_chart(ui, chart, height),
            ChartKind::Donut => Self::draw_donut_chart(ui, chart, height),
        }
    }

    /// Bar chart with one bar per point; labels sit on the category axis.
    fn draw_bar_chart(ui: &mut egui::Ui, chart: &ChartData, height: f32, horizontal: bool) {
        let labels: Vec<String> = chart.points.iter().map(|(l, _)| l.clone()).collect();

        let bars: Vec<Bar> = chart
            .points
            .iter()
            .enumerate()
            .map(|(i, (label, value))| {
                Bar::new(i as f64, *value)
                    .name(label)
                    .fill(to_color32(chart.color_for(i)))
                    .width(0.6)
            })
            .collect();

        let mut bar_chart = BarChart::new(bars).name(&chart.title);
        if horizontal {
            bar_chart = bar_chart.horizontal();
        }

        let mut plot = Plot::new(format!("bars_{}", chart.id))
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label(chart.x_label)
            .y_axis_label(chart.y_label);

        plot = if horizontal {
            plot.include_x(0.0).y_axis_formatter(label_formatter(labels))
        } else {
            plot.include_y(0.0).x_axis_formatter(label_formatter(labels))
        };

        plot.show(ui, |plot_ui| {
            plot_ui.bar_chart(bar_chart);
        });
    }

    /// Line with markers; point labels are numeric x positions (hours).
    fn draw_line_chart(ui: &mut egui::Ui, chart: &ChartData, height: f32) {
        let color = to_color32(chart.color_for(0));
        let coords: Vec<[f64; 2]> = chart
            .points
            .iter()
            .enumerate()
            .map(|(i, (label, value))| [label.parse::<f64>().unwrap_or(i as f64), *value])
            .collect();

        Plot::new(format!("line_{}", chart.id))
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(0.0)
            .x_axis_label(chart.x_label)
            .y_axis_label(chart.y_label)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(coords.clone()))
                        .color(color)
                        .width(2.0)
                        .name(&chart.title),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(coords))
                        .radius(4.0)
                        .color(color),
                );
            });
    }

    /// Donut of shares with a legend underneath.
    fn draw_donut_chart(ui: &mut egui::Ui, chart: &ChartData, height: f32) {
        let total: f64 = chart.points.iter().map(|(_, v)| v.max(0.0)).sum();
        let legend_height = 24.0;
        let size = egui::vec2(ui.available_width(), (height - legend_height).max(60.0));
        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        let painter = ui.painter_at(rect);

        let center = rect.center();
        let outer = rect.width().min(rect.height()) * 0.45;
        let inner = outer * DONUT_HOLE;
        let at = |radius: f32, angle: f32| -> Pos2 {
            center + egui::vec2(angle.cos(), angle.sin()) * radius
        };

        if total > 0.0 {
            let mut start = -FRAC_PI_2;
            for (i, (_, value)) in chart.points.iter().enumerate() {
                let share = (value.max(0.0) / total) as f32;
                let sweep = share * TAU;
                let color = to_color32(chart.color_for(i));

                let steps = ((sweep / ARC_STEP).ceil() as usize).max(1);
                for step in 0..steps {
                    let a0 = start + sweep * step as f32 / steps as f32;
                    let a1 = start + sweep * (step + 1) as f32 / steps as f32;
                    painter.add(Shape::convex_polygon(
                        vec![at(outer, a0), at(outer, a1), at(inner, a1), at(inner, a0)],
                        color,
                        Stroke::NONE,
                    ));
                }

                if share > 0.04 {
                    painter.text(
                        at((outer + inner) / 2.0, start + sweep / 2.0),
                        Align2::CENTER_CENTER,
                        format!("{:.1}%", share * 100.0),
                        FontId::proportional(12.0),
                        Color32::BLACK,
                    );
                }
                start += sweep;
            }
        }

        ui.horizontal_wrapped(|ui| {
            for (i, (label, _)) in chart.points.iter().enumerate() {
                let (swatch, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(swatch, 3.0, to_color32(chart.color_for(i)));
                ui.label(RichText::new(label).size(13.0));
                ui.add_space(10.0);
            }
        });
    }
}
