use std::path::PathBuf;

use iris_explorer::analysis::{AnalysisRunner, DatasetSource, WindowRenderer};

fn main() {
    env_logger::init();

    // An optional path replaces the bundled reference dataset.
    let source = std::env::args_os()
        .nth(1)
        .map(|p| DatasetSource::File(PathBuf::from(p)))
        .unwrap_or_default();

    let mut runner = AnalysisRunner::new(source, WindowRenderer);
    let outcome = runner.run(&mut std::io::stdout().lock());
    log::debug!("Run finished: {outcome:?}");
}
