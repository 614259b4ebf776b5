use anyhow::Result;
use eframe::egui::Color32;

use crate::color;
use crate::data::model::{Column, Dataset};

/// Bins used for the sepal length distribution.
pub const HISTOGRAM_BINS: usize = 15;

// ---------------------------------------------------------------------------
// Chart description – what to draw, independent of the window backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Window inner size in logical points.
    pub size: [f32; 2],
    pub kind: ChartKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Line(Series),
    /// One bar per category, drawn at x = 0, 1, 2, … and labelled on the axis.
    Bar(Vec<CategoryBar>),
    Histogram {
        bins: Vec<HistogramBin>,
        fill: Color32,
        edge: Color32,
    },
    /// One point series per group, shown in the legend.
    Scatter {
        groups: Vec<Series>,
        legend_title: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Color32,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBar {
    pub label: String,
    pub value: f64,
    pub color: Color32,
}

/// One equal-width bin: `[start, end)`, except the last which is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

impl Chart {
    /// Stable id for the plot widget.
    pub fn id(&self) -> String {
        self.title.to_ascii_lowercase().replace(|c: char| !c.is_alphanumeric(), "_")
    }
}

// ---------------------------------------------------------------------------
// The four report charts
// ---------------------------------------------------------------------------

/// All report charts, in display order.
pub fn report_charts(dataset: &Dataset) -> Result<Vec<Chart>> {
    Ok(vec![
        cumulative_petal_length(dataset)?,
        mean_petal_length_by_species(dataset)?,
        sepal_length_distribution(dataset)?,
        sepal_vs_petal_length(dataset)?,
    ])
}

/// Line: running total of petal length against the row label.
pub fn cumulative_petal_length(dataset: &Dataset) -> Result<Chart> {
    let points = dataset
        .cumulative_sum(Column::PetalLength)?
        .into_iter()
        .map(|(idx, total)| [idx as f64, total])
        .collect();

    Ok(Chart {
        title: "Line Chart: Cumulative Petal Length".into(),
        x_label: "Sample Index".into(),
        y_label: "Cumulative Petal Length (cm)".into(),
        size: [800.0, 500.0],
        kind: ChartKind::Line(Series {
            name: "Cumulative Petal Length".into(),
            color: color::teal(),
            points,
        }),
    })
}

/// Bar: mean petal length per species.
pub fn mean_petal_length_by_species(dataset: &Dataset) -> Result<Chart> {
    let means = dataset.group_means()?;
    let bars = color::pastel_species_palette()
        .into_iter()
        .filter_map(|(sp, color)| {
            let value = means
                .get(&sp)?
                .iter()
                .find(|(c, _)| *c == Column::PetalLength)?
                .1?;
            Some(CategoryBar {
                label: sp.name().to_string(),
                value,
                color,
            })
        })
        .collect();

    Ok(Chart {
        title: "Bar Chart: Average Petal Length per Species".into(),
        x_label: "Species".into(),
        y_label: "Average Petal Length (cm)".into(),
        size: [600.0, 400.0],
        kind: ChartKind::Bar(bars),
    })
}

/// Histogram: sepal length over [`HISTOGRAM_BINS`] equal-width bins.
pub fn sepal_length_distribution(dataset: &Dataset) -> Result<Chart> {
    Ok(Chart {
        title: "Histogram: Distribution of Sepal Length".into(),
        x_label: "Sepal Length (cm)".into(),
        y_label: "Frequency".into(),
        size: [600.0, 400.0],
        kind: ChartKind::Histogram {
            bins: histogram(&dataset.column(Column::SepalLength)?, HISTOGRAM_BINS),
            fill: color::sky_blue(),
            edge: Color32::BLACK,
        },
    })
}

/// Scatter: sepal length against petal length, coloured by species.
pub fn sepal_vs_petal_length(dataset: &Dataset) -> Result<Chart> {
    let present = dataset.species()?;
    let records = dataset.records()?;
    let groups = color::bold_species_palette()
        .into_iter()
        .filter(|(sp, _)| present.contains(sp))
        .map(|(sp, color)| Series {
            name: sp.name().to_string(),
            color,
            points: records
                .iter()
                .filter(|r| r.species == Some(sp))
                .filter_map(|r| Some([r.sepal_length?, r.petal_length?]))
                .collect(),
        })
        .collect();

    Ok(Chart {
        title: "Scatter Plot: Sepal Length vs Petal Length".into(),
        x_label: "Sepal Length (cm)".into(),
        y_label: "Petal Length (cm)".into(),
        size: [600.0, 500.0],
        kind: ChartKind::Scatter {
            groups,
            legend_title: "Species".into(),
        },
    })
}

/// Split `[min, max]` of `values` into `bins` equal-width bins and count
/// members. A constant column is widened by 0.5 on each side.
fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for &v in values {
        let slot = (((v - lo) / width) as usize).min(bins - 1);
        out[slot].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_bundled;
    use approx::assert_relative_eq;

    #[test]
    fn test_report_chart_order() {
        let ds = load_bundled().unwrap();
        let kinds: Vec<&str> = report_charts(&ds)
            .unwrap()
            .iter()
            .map(|c| match c.kind {
                ChartKind::Line(_) => "line",
                ChartKind::Bar(_) => "bar",
                ChartKind::Histogram { .. } => "histogram",
                ChartKind::Scatter { .. } => "scatter",
            })
            .collect();
        assert_eq!(kinds, vec!["line", "bar", "histogram", "scatter"]);
    }

    #[test]
    fn test_cumulative_line_is_monotone_and_ends_at_total() {
        let ds = load_bundled().unwrap();
        let ChartKind::Line(series) = cumulative_petal_length(&ds).unwrap().kind else {
            panic!("expected a line chart");
        };
        assert_eq!(series.points.len(), 150);
        assert!(series.points.windows(2).all(|w| w[1][1] >= w[0][1]));
        assert_relative_eq!(series.points[0][0], 0.0);
        assert_relative_eq!(series.points[149][0], 149.0);

        let total: f64 = ds.column(Column::PetalLength).unwrap().iter().sum();
        assert_relative_eq!(series.points[149][1], total, epsilon = 1e-9);
        assert_relative_eq!(total, 563.7, epsilon = 1e-9);
    }

    #[test]
    fn test_bar_heights_are_species_means() {
        let ds = load_bundled().unwrap();
        let ChartKind::Bar(bars) = mean_petal_length_by_species(&ds).unwrap().kind else {
            panic!("expected a bar chart");
        };
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["setosa", "versicolor", "virginica"]);
        assert_relative_eq!(bars[0].value, 1.462, epsilon = 1e-9);
        assert_relative_eq!(bars[1].value, 4.26, epsilon = 1e-9);
        assert_relative_eq!(bars[2].value, 5.552, epsilon = 1e-9);
    }

    #[test]
    fn test_histogram_covers_every_sample() {
        let ds = load_bundled().unwrap();
        let ChartKind::Histogram { bins, .. } = sepal_length_distribution(&ds).unwrap().kind else {
            panic!("expected a histogram");
        };
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 150);
        assert_relative_eq!(bins[0].start, 4.3);
        assert_relative_eq!(bins[HISTOGRAM_BINS - 1].end, 7.9);
    }

    #[test]
    fn test_scatter_groups_by_species() {
        let ds = load_bundled().unwrap();
        let chart = sepal_vs_petal_length(&ds).unwrap();
        let ChartKind::Scatter { groups, legend_title } = chart.kind else {
            panic!("expected a scatter plot");
        };
        assert_eq!(legend_title, "Species");
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.points.len() == 50));
        assert_ne!(groups[0].color, groups[2].color);
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 2]);
        assert_relative_eq!(bins[3].end, 4.0);
        assert_relative_eq!(bins[0].width(), 1.0);
        assert_relative_eq!(bins[0].center(), 0.5);
    }

    #[test]
    fn test_histogram_constant_column() {
        let bins = histogram(&[2.0, 2.0, 2.0], 2);
        assert_relative_eq!(bins[0].start, 1.5);
        assert_relative_eq!(bins[1].end, 2.5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert!(histogram(&[], 4).is_empty());
    }

    #[test]
    fn test_chart_id_is_widget_safe() {
        let ds = load_bundled().unwrap();
        assert_eq!(
            cumulative_petal_length(&ds).unwrap().id(),
            "line_chart__cumulative_petal_length"
        );
    }
}
