use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub const FETCH_REPLY: &str = "METADATA_FetchObjectVersionReply";
pub const INIT_EVENT: &str = "INIT";

const THREADS_PATTERN: &str = r"TH-(\d+)";
static THREADS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(THREADS_PATTERN).unwrap());

fn open(path: &Path) -> Result<BufReader<File>, AnalysisError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| AnalysisError::io(path, e))
}

/// Iterates lines with their 1-based line number, turning read errors into
/// [`AnalysisError::Io`].
fn numbered_lines<'a, R: BufRead + 'a>(
    reader: R,
    path: &'a Path,
) -> impl Iterator<Item = Result<(usize, String), AnalysisError>> + 'a {
    reader.lines().enumerate().map(move |(i, line)| {
        line.map(|line| (i + 1, line))
            .map_err(|e| AnalysisError::io(path, e))
    })
}

fn parse_int(path: &Path, line: usize, field: &str, what: &str) -> Result<i64, AnalysisError> {
    field
        .trim()
        .parse::<i64>()
        .map_err(|e| AnalysisError::malformed(path, line, format!("{what} {field:?}: {e}")))
}

fn add(path: &Path, line: usize, a: i64, b: i64) -> Result<i64, AnalysisError> {
    a.checked_add(b)
        .ok_or_else(|| AnalysisError::malformed(path, line, "value overflows i64"))
}

/// Number of client threads encoded in the log name as `TH-<n>`.
pub fn thread_count(path: &Path) -> Result<u32, AnalysisError> {
    let file_name = path
        .file_name()
        .map(|x| x.to_string_lossy())
        .unwrap_or_default();
    let threads = THREADS_REGEX
        .captures(&file_name)
        .and_then(|c| c.get(1))
        .ok_or_else(|| AnalysisError::MissingPattern {
            path: path.to_path_buf(),
            pattern: THREADS_PATTERN,
        })?
        .as_str()
        .parse::<u32>()
        .map_err(|_| AnalysisError::InvalidThreadCount {
            path: path.to_path_buf(),
        })?;
    if threads == 0 {
        return Err(AnalysisError::InvalidThreadCount {
            path: path.to_path_buf(),
        });
    }
    Ok(threads)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthWindows {
    /// Length of the startup phase after the first INIT event
    pub startup: i64,
    /// Length of the phase following the startup phase
    pub after: i64,
}

impl Default for BandwidthWindows {
    fn default() -> Self {
        Self {
            startup: 30_000,
            after: 60_000,
        }
    }
}

/// Fetch reply bytes per thread in each phase of one client log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthSample {
    pub startup: f64,
    pub after: f64,
}

pub fn parse_bandwidth_log<R: BufRead>(
    reader: R,
    path: &Path,
    threads: u32,
    windows: BandwidthWindows,
) -> Result<BandwidthSample, AnalysisError> {
    let mut cutoffs: Option<(i64, i64)> = None;
    let mut startup = 0i64;
    let mut after = 0i64;

    for line in numbered_lines(reader, path) {
        let (n, line) = line?;
        if line.starts_with(';') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            return Err(AnalysisError::malformed(
                path,
                n,
                format!("expected at least 3 fields, got {}", fields.len()),
            ));
        }

        if fields[1] == INIT_EVENT && cutoffs.is_none() {
            let start = fields
                .get(3)
                .ok_or_else(|| AnalysisError::malformed(path, n, "INIT without a time"))?;
            let start = parse_int(path, n, start, "INIT time")?;
            let cutoff = add(path, n, start, windows.startup)?;
            cutoffs = Some((cutoff, add(path, n, cutoff, windows.after)?));
        }

        if fields[2] == FETCH_REPLY {
            let time = parse_int(path, n, fields[1], "timestamp")?;
            let size = fields
                .get(3)
                .ok_or_else(|| AnalysisError::malformed(path, n, "reply without a size"))?;
            let size = parse_int(path, n, size, "size")?;
            match cutoffs {
                Some((cutoff, _)) if time < cutoff => startup = add(path, n, startup, size)?,
                Some((_, cutoff_after)) if time < cutoff_after => {
                    after = add(path, n, after, size)?
                }
                _ => {}
            }
        }
    }

    Ok(BandwidthSample {
        startup: startup as f64 / threads as f64,
        after: after as f64 / threads as f64,
    })
}

pub fn read_bandwidth_log(
    path: &Path,
    windows: BandwidthWindows,
) -> Result<BandwidthSample, AnalysisError> {
    let threads = thread_count(path)?;
    parse_bandwidth_log(open(path)?, path, threads, windows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMode {
    /// Sum of all counts at or after the given time
    SumFrom(i64),
    /// Largest value in the file
    Max,
}

/// Reduces a `time;value` counter log to one value.
///
/// [`CounterMode::Max`] yields `None` for a file without lines.
pub fn parse_counter_log<R: BufRead>(
    reader: R,
    path: &Path,
    mode: CounterMode,
) -> Result<Option<i64>, AnalysisError> {
    let mut sum = 0i64;
    let mut max: Option<i64> = None;

    for line in numbered_lines(reader, path) {
        let (n, line) = line?;
        let Some((time, value)) = line.split_once(';').filter(|(_, v)| !v.contains(';')) else {
            return Err(AnalysisError::malformed(
                path,
                n,
                "expected exactly 2 ';' separated fields",
            ));
        };

        match mode {
            CounterMode::SumFrom(start) => {
                if parse_int(path, n, time, "time")? >= start {
                    sum = add(path, n, sum, parse_int(path, n, value, "count")?)?;
                }
            }
            CounterMode::Max => {
                let parsed = value.trim().parse::<f64>().map_err(|e| {
                    AnalysisError::malformed(path, n, format!("value {value:?}: {e}"))
                })?;
                if !parsed.is_finite() {
                    return Err(AnalysisError::malformed(
                        path,
                        n,
                        format!("value {value:?} is not finite"),
                    ));
                }
                let value = parsed.trunc() as i64;
                max = Some(max.map_or(value, |m| m.max(value)));
            }
        }
    }

    Ok(match mode {
        CounterMode::SumFrom(_) => Some(sum),
        CounterMode::Max => max,
    })
}

pub fn read_counter_log(path: &Path, mode: CounterMode) -> Result<Option<i64>, AnalysisError> {
    parse_counter_log(open(path)?, path, mode)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySizes {
    pub replies: u64,
    pub total: i64,
}

impl ReplySizes {
    pub fn average(&self) -> Result<f64, AnalysisError> {
        if self.replies == 0 {
            return Err(AnalysisError::EmptySampleSet {
                group: FETCH_REPLY.to_owned(),
            });
        }
        Ok(self.total as f64 / self.replies as f64)
    }
}

/// Counts fetch replies and their total size in an event log.
pub fn parse_reply_sizes<R: BufRead>(reader: R, path: &Path) -> Result<ReplySizes, AnalysisError> {
    let mut sizes = ReplySizes::default();
    for line in numbered_lines(reader, path) {
        let (n, line) = line?;
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        if fields.len() >= 3 && fields[2] == FETCH_REPLY {
            let size = fields
                .get(3)
                .ok_or_else(|| AnalysisError::malformed(path, n, "reply without a size"))?;
            sizes.replies += 1;
            sizes.total = add(path, n, sizes.total, parse_int(path, n, size, "size")?)?;
        }
    }
    Ok(sizes)
}

pub fn read_reply_sizes(path: &Path) -> Result<ReplySizes, AnalysisError> {
    parse_reply_sizes(open(path)?, path)
}
