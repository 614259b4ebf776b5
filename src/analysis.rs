use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::chart::{self, Chart};
use crate::data::loader::{self, LoadError};
use crate::data::model::Dataset;
use crate::report;

/// Rows shown in the opening preview.
const HEAD_ROWS: usize = 5;

const FINDINGS: [&str; 2] = [
    "- Setosa species generally has the smallest petal length & width.",
    "- Virginica has the largest overall flower dimensions.",
];

// ---------------------------------------------------------------------------
// Inputs and seams
// ---------------------------------------------------------------------------

/// Where the table comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DatasetSource {
    /// The reference dataset compiled into the binary.
    #[default]
    Bundled,
    /// A CSV / JSON / Parquet file on disk.
    File(PathBuf),
}

impl DatasetSource {
    pub fn load(&self) -> Result<Dataset> {
        match self {
            DatasetSource::Bundled => loader::load_bundled(),
            DatasetSource::File(path) => loader::load_file(path),
        }
    }
}

/// Displays one chart. Returns once the chart is no longer on screen.
pub trait ChartRenderer {
    fn render(&mut self, chart: &Chart) -> Result<()>;
}

/// Native window per chart, opened one after another.
pub struct WindowRenderer;

impl ChartRenderer for WindowRenderer {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        crate::app::show_window(chart)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed,
}

// ---------------------------------------------------------------------------
// AnalysisRunner
// ---------------------------------------------------------------------------

pub struct AnalysisRunner<R> {
    source: DatasetSource,
    renderer: R,
}

impl<R: ChartRenderer> AnalysisRunner<R> {
    pub fn new(source: DatasetSource, renderer: R) -> Self {
        Self { source, renderer }
    }

    /// Load, report and plot. Every failure is turned into one line on
    /// `out` and ends the run; nothing is propagated to the caller.
    pub fn run(&mut self, out: &mut impl Write) -> RunOutcome {
        match self.try_run(out) {
            Ok(()) => {
                log::info!("Analysis completed");
                RunOutcome::Completed
            }
            Err(err) => {
                log::error!("Analysis failed: {err:#}");
                // Nowhere left to report a failing sink.
                let _ = writeln!(out, "{}", failure_message(&err));
                RunOutcome::Failed
            }
        }
    }

    fn try_run(&mut self, out: &mut impl Write) -> Result<()> {
        log::debug!("Loading dataset from {:?}", self.source);
        let dataset = self.source.load()?;
        log::info!("Loaded {} records", dataset.len());

        writeln!(out, "Dataset loaded successfully!\n")?;

        writeln!(out, "First {HEAD_ROWS} rows of the dataset:")?;
        report::write_records(out, &dataset.head(HEAD_ROWS)?)?;
        writeln!(out)?;

        writeln!(out, "Dataset Info:")?;
        report::write_info(out, &dataset)?;
        writeln!(out)?;

        writeln!(out, "Missing values per column:")?;
        report::write_null_counts(out, &dataset)?;
        writeln!(out)?;

        let dataset = clean(out, dataset)?;

        writeln!(out, "Basic Statistics:")?;
        report::write_summary(out, &dataset.describe()?)?;
        writeln!(out)?;

        writeln!(out, "Average values grouped by species:")?;
        report::write_group_means(out, &dataset.group_means()?)?;
        writeln!(out)?;

        writeln!(out, "Interesting Findings:")?;
        for line in FINDINGS {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
        out.flush()?;

        for chart in chart::report_charts(&dataset)? {
            log::info!("Rendering '{}'", chart.title);
            self.renderer.render(&chart)?;
        }
        Ok(())
    }
}

/// Drop incomplete rows if there are any, reporting what happened.
fn clean(out: &mut impl Write, dataset: Dataset) -> Result<Dataset> {
    if !dataset.has_nulls() {
        writeln!(out, "No missing values detected.\n")?;
        return Ok(dataset);
    }
    let (dataset, removed) = dataset.drop_nulls()?;
    log::info!("Dropped {removed} incomplete rows, {} remain", dataset.len());
    writeln!(out, "Missing values found and dropped.")?;
    writeln!(out, "Rows removed: {removed}\n")?;
    Ok(dataset)
}

/// The user-facing sentence for a failed run.
pub fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<LoadError>() {
        Some(LoadError::NotFound(_)) => "Error: Dataset file not found.".to_string(),
        Some(LoadError::Empty(_)) => "Error: Dataset file is empty.".to_string(),
        None => format!("Unexpected error: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    /// Records chart titles instead of opening windows.
    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Vec<String>,
        fail_on: Option<usize>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render(&mut self, chart: &Chart) -> Result<()> {
            if self.fail_on == Some(self.rendered.len()) {
                bail!("no display available");
            }
            self.rendered.push(chart.title.clone());
            Ok(())
        }
    }

    fn run_with(
        source: DatasetSource,
        renderer: RecordingRenderer,
    ) -> (RunOutcome, String, Vec<String>) {
        let mut runner = AnalysisRunner::new(source, renderer);
        let mut out = Vec::new();
        let outcome = runner.run(&mut out);
        let rendered = runner.renderer.rendered.clone();
        (outcome, String::from_utf8(out).unwrap(), rendered)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("iris-explorer-run-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_bundled_run_reports_in_order_and_renders_four_charts() {
        let (outcome, text, rendered) =
            run_with(DatasetSource::Bundled, RecordingRenderer::default());

        assert_eq!(outcome, RunOutcome::Completed);
        assert!(text.starts_with("Dataset loaded successfully!"));
        assert_eq!(rendered.len(), 4);
        assert_eq!(rendered[0], "Line Chart: Cumulative Petal Length");
        assert_eq!(rendered[3], "Scatter Plot: Sepal Length vs Petal Length");

        let headings = [
            "First 5 rows of the dataset:",
            "Dataset Info:",
            "Missing values per column:",
            "No missing values detected.",
            "Basic Statistics:",
            "Average values grouped by species:",
            "Interesting Findings:",
            FINDINGS[0],
            FINDINGS[1],
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|h| text.find(h).unwrap_or_else(|| panic!("missing '{h}'")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!text.contains("Error"));
    }

    #[test]
    fn test_missing_source_prints_not_found_and_renders_nothing() {
        let source = DatasetSource::File(temp_path("absent.csv"));
        let (outcome, text, rendered) = run_with(source, RecordingRenderer::default());

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(text, "Error: Dataset file not found.\n");
        assert!(rendered.is_empty());
    }

    #[test]
    fn test_empty_source_prints_empty_and_renders_nothing() {
        let path = temp_path("empty.csv");
        std::fs::write(&path, "").unwrap();
        let (outcome, text, rendered) =
            run_with(DatasetSource::File(path.clone()), RecordingRenderer::default());
        std::fs::remove_file(&path).unwrap();

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(text, "Error: Dataset file is empty.\n");
        assert!(rendered.is_empty());
    }

    #[test]
    fn test_renderer_failure_stops_remaining_charts() {
        let renderer = RecordingRenderer {
            fail_on: Some(1),
            ..Default::default()
        };
        let (outcome, text, rendered) = run_with(DatasetSource::Bundled, renderer);

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(rendered.len(), 1);
        assert!(text.trim_end().ends_with("Unexpected error: no display available"));
    }

    #[test]
    fn test_incomplete_rows_are_dropped_and_cleaning_is_idempotent() {
        let path = temp_path("gaps.csv");
        std::fs::write(
            &path,
            "sepal length (cm),sepal width (cm),petal length (cm),petal width (cm),target\n\
             5.1,3.5,1.4,0.2,0\n\
             ,3.0,1.4,0.2,0\n\
             7.0,3.2,4.7,1.4,1\n\
             6.3,3.3,6.0,2.5,9\n",
        )
        .unwrap();
        let (outcome, text, rendered) =
            run_with(DatasetSource::File(path.clone()), RecordingRenderer::default());

        assert_eq!(outcome, RunOutcome::Completed);
        assert!(text.contains("Missing values found and dropped."));
        assert!(text.contains("Rows removed: 2"));
        assert_eq!(rendered.len(), 4);

        let dataset = DatasetSource::File(path.clone()).load().unwrap();
        std::fs::remove_file(&path).unwrap();
        let (clean_ds, _) = dataset.drop_nulls().unwrap();
        assert!(clean_ds.null_counts().unwrap().iter().all(|&(_, n)| n == 0));

        let mut again = Vec::new();
        let clean_ds = clean(&mut again, clean_ds).unwrap();
        assert_eq!(String::from_utf8(again).unwrap(), "No missing values detected.\n\n");
        assert_eq!(clean_ds.len(), 2);
    }

    #[test]
    fn test_describe_bounds_and_group_means_on_reference_data() {
        let dataset = DatasetSource::Bundled.load().unwrap();
        for (_, s) in dataset.describe().unwrap() {
            assert_eq!(s.count, dataset.len());
            assert!(s.min <= s.q25 && s.q25 <= s.q50 && s.q50 <= s.q75 && s.q75 <= s.max);
        }
        for (species, means) in dataset.group_means().unwrap() {
            for (col, mean) in means {
                let values = dataset.species_column(species, col).unwrap();
                let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = mean.unwrap();
                assert!(lo <= mean && mean <= hi, "{species} {col}: {mean} not in [{lo}, {hi}]");
            }
        }
    }

    #[test]
    fn test_unexpected_error_keeps_the_cause_chain() {
        let path = temp_path("malformed.csv");
        std::fs::write(
            &path,
            "sepal length (cm),sepal width (cm),petal length (cm),petal width (cm),target\n\
             abc,3.5,1.4,0.2,0\n",
        )
        .unwrap();
        let (outcome, text, rendered) =
            run_with(DatasetSource::File(path.clone()), RecordingRenderer::default());
        std::fs::remove_file(&path).unwrap();

        assert_eq!(outcome, RunOutcome::Failed);
        assert!(rendered.is_empty());
        assert!(text.starts_with("Unexpected error: CSV row 0: "), "{text}");
        assert!(text.contains("invalid float literal"), "{text}");
    }
}
