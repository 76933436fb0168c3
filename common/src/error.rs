use std::path::PathBuf;

use thiserror::Error;

use crate::classify::Variant;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{path}: file name does not match {pattern}")]
    MissingPattern { path: PathBuf, pattern: &'static str },
    #[error("{path}: thread count must be positive")]
    InvalidThreadCount { path: PathBuf },
    #[error("{path}:{line}: malformed record: {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("No samples for {group}")]
    EmptySampleSet { group: String },
    #[error("No run directory classified as {0}")]
    MissingVariant(Variant),
    #[error("Lazy series has {lazy} groups but non-lazy series has {non_lazy}")]
    SeriesLengthMismatch { lazy: usize, non_lazy: usize },
    #[error("Argument {0} has no directory to pair with")]
    UnpairedArgument(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Plot data: {0}")]
    PlotData(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(
        path: impl Into<PathBuf>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}
