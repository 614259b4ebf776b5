use std::ops::RangeInclusive;

use eframe::egui::{Stroke, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::chart::{CategoryBar, Chart, ChartKind, Series};

// ---------------------------------------------------------------------------
// Chart plot (central panel)
// ---------------------------------------------------------------------------

/// Render one chart into the central panel.
pub fn chart_plot(ui: &mut Ui, chart: &Chart) {
    let plot = Plot::new(chart.id())
        .x_axis_label(chart.x_label.as_str())
        .y_axis_label(chart.y_label.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    match &chart.kind {
        ChartKind::Line(series) => {
            plot.legend(Legend::default()).show(ui, |plot_ui| {
                plot_ui.line(line(series));
            });
        }
        ChartKind::Bar(bars) => {
            let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
            plot.x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                category_label(&labels, mark.value)
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(category_bars(bars));
            });
        }
        ChartKind::Histogram { bins, fill, edge } => {
            let bars: Vec<Bar> = bins
                .iter()
                .map(|bin| {
                    Bar::new(bin.center(), bin.count as f64)
                        .width(bin.width())
                        .fill(*fill)
                        .stroke(Stroke::new(1.0, *edge))
                        .name(format!("{:.2} – {:.2}", bin.start, bin.end))
                })
                .collect();
            plot.show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
        }
        ChartKind::Scatter {
            groups,
            legend_title,
        } => {
            ui.label(legend_title);
            plot.legend(Legend::default()).show(ui, |plot_ui| {
                for group in groups {
                    plot_ui.points(points(group));
                }
            });
        }
    }
}

fn line(series: &Series) -> Line<'_> {
    let points: PlotPoints = series.points.iter().copied().collect();
    Line::new(points)
        .name(&series.name)
        .color(series.color)
        .width(1.5)
}

fn points(series: &Series) -> Points<'_> {
    let points: PlotPoints = series.points.iter().copied().collect();
    Points::new(points)
        .name(&series.name)
        .color(series.color)
        .radius(3.0)
}

fn category_bars(bars: &[CategoryBar]) -> BarChart {
    let bars = bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            Bar::new(i as f64, b.value)
                .width(0.6)
                .fill(b.color)
                .name(&b.label)
        })
        .collect();
    BarChart::new(bars)
}

/// Axis text for a category chart: the label at whole-number ticks, blank elsewhere.
fn category_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label_only_on_whole_ticks() {
        let labels = vec!["setosa".to_string(), "versicolor".to_string()];
        assert_eq!(category_label(&labels, 0.0), "setosa");
        assert_eq!(category_label(&labels, 1.0), "versicolor");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }
}
