use crate::errors::{report_brief_summary, report_failures};
use crate::io::output::{create_writer, OutputFormat};
use crate::pipeline::{run_pipeline, RunOptions, RunSummary};
use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

pub struct RunConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub overrides: Vec<String>,
    pub dry_run: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub jobs: usize,
}

/// Run the pipeline and write the summary in the requested format.
///
/// Setup failures are returned as [`crate::errors::DepshiftError`] inside the
/// `anyhow` error so the caller can map them to an exit code.
pub fn run_project(config: RunConfig) -> Result<RunSummary> {
    if config.jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build_global()
            .ok(); // Ignore if already configured
    }

    let options = RunOptions {
        root: config.path,
        config_path: config.config,
        overrides: config.overrides,
        dry_run: config.dry_run,
    };
    let summary = run_pipeline(&options)?;
    debug!("Run reached state {}", summary.state);

    let mut writer = create_writer(config.format, config.output.as_deref())?;
    writer.write_summary(&summary)?;

    if !summary.failures.is_empty() && config.format == OutputFormat::Terminal {
        report_brief_summary(summary.files_scanned, &summary.failures);
        report_failures(&summary.failures);
    }
    Ok(summary)
}
