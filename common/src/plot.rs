use core::fmt::Debug;
use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::Result;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    error::AnalysisError,
    locate::{FileQuery, find_files},
    render::{BarChart, render_bar_chart},
    stats::{GroupSummary, SampleGroup},
};

pub trait Plot: Debug {
    fn name(&self) -> &'static str;
    /// Reads the runs, renders the charts and returns the written chart paths
    ///
    /// Arguments:
    /// * `runs` - The run directories in command line order
    /// * `settings` - Output location, windows and axis limits
    fn plot(&self, runs: &[RunDir], settings: &Settings) -> Result<Vec<PathBuf>>;
}

/// A run directory given on the command line, optionally with its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    pub name: Option<String>,
    pub path: PathBuf,
}

impl RunDir {
    pub fn unnamed(path: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            path: path.into(),
        }
    }

    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Turns `name dir name dir ...` into labelled runs.
pub fn pair_runs(args: &[String]) -> Result<Vec<RunDir>, AnalysisError> {
    if args.len() % 2 != 0 {
        return Err(AnalysisError::UnpairedArgument(
            args.last().cloned().unwrap_or_default(),
        ));
    }
    Ok(args
        .chunks_exact(2)
        .map(|pair| RunDir {
            name: Some(pair[0].clone()),
            path: PathBuf::from(&pair[1]),
        })
        .collect())
}

/// Reads one scalar per matching file of every run.
pub fn collect_samples<F>(
    runs: &[RunDir],
    query: &FileQuery,
    read: F,
) -> Result<Vec<SampleGroup>, AnalysisError>
where
    F: Fn(&Path) -> Result<f64, AnalysisError>,
{
    let mut groups = Vec::with_capacity(runs.len());
    for run in runs {
        let files = find_files(&run.path, query)?;
        debug!("{}: {} files", run.path.display(), files.len());
        let samples = files
            .iter()
            .map(|file| read(file))
            .collect::<Result<Vec<_>, _>>()?;
        groups.push(SampleGroup {
            name: run.label(),
            dir: run.path.clone(),
            samples,
        });
    }
    Ok(groups)
}

/// Writes the numbers behind a chart to `plot_data/<stem>.json`.
pub fn write_plot_data(
    settings: &Settings,
    stem: &str,
    groups: &[GroupSummary],
) -> Result<PathBuf, AnalysisError> {
    let dir = settings.plot_data_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| AnalysisError::io(&dir, e))?;
    }
    let path = dir.join(format!("{stem}.json"));
    let data = serde_json::to_string_pretty(groups)?;
    fs::write(&path, data).map_err(|e| AnalysisError::io(&path, e))?;
    Ok(path)
}

/// Renders `chart` as `<stem>.pdf` and `<stem>.svg` and stores its plot data.
pub fn emit_chart(
    settings: &Settings,
    stem: &str,
    chart: &BarChart,
    groups: &[GroupSummary],
) -> Result<PathBuf, AnalysisError> {
    let path = settings.output_path(stem);
    render_bar_chart(&path, chart, (settings.width, settings.height))?;
    write_plot_data(settings, stem, groups)?;
    info!("Wrote {}", path.display());
    Ok(path)
}

pub fn ensure_output_dir(settings: &Settings) -> Result<(), AnalysisError> {
    if !settings.output_dir.exists() {
        fs::create_dir_all(&settings.output_dir)
            .map_err(|e| AnalysisError::io(&settings.output_dir, e))?;
    }
    Ok(())
}

/// Runs `plot` and reports the files it wrote.
pub fn plot(plot: &dyn Plot, runs: &[RunDir], settings: &Settings) -> Result<Vec<PathBuf>> {
    debug!("Running {} over {} runs", plot.name(), runs.len());
    ensure_output_dir(settings)?;
    let written = plot.plot(runs, settings)?;
    if written.is_empty() {
        warn!("{} produced no charts", plot.name());
    }
    Ok(written)
}
