use std::path::PathBuf;

use common::{
    classify::Classifier,
    config::Settings,
    locate::FileQuery,
    parse::{CounterMode, read_counter_log},
    plot::{Plot, RunDir, collect_samples, emit_chart},
    render::{grouped_variant_chart, single_series_chart},
    stats::{GroupSummary, SampleGroup, split_by_variant},
};
use eyre::Result;
use tracing::debug;

const MISS_FILE: &str = "miss-no-object-count";
const SCOUT_DIR: &str = "scout-";
const Y_LABEL: &str = "Number of cache misses";

/// Misses per scout summed from the start offset on.
fn read_misses(runs: &[RunDir], settings: &Settings) -> Result<Vec<SampleGroup>> {
    let mode = CounterMode::SumFrom(settings.cache.miss_start_offset);
    let query = FileQuery::exact(MISS_FILE).within(SCOUT_DIR);
    Ok(collect_samples(runs, &query, |path| {
        let misses = read_counter_log(path, mode)?.unwrap_or_default();
        debug!("{}: {misses} misses", path.display());
        Ok(misses as f64)
    })?)
}

fn print_summaries<'a>(groups: impl Iterator<Item = &'a GroupSummary>) {
    for group in groups {
        println!("{}: {}", group.name, group.summary);
    }
}

/// Cache misses of lazy and non-lazy runs per cache size limit.
#[derive(Debug, Default, Clone)]
pub struct CacheMisses;

impl Plot for CacheMisses {
    fn name(&self) -> &'static str {
        "cache-misses"
    }

    fn plot(&self, runs: &[RunDir], settings: &Settings) -> Result<Vec<PathBuf>> {
        let groups = read_misses(runs, settings)?;
        let summaries = groups
            .iter()
            .map(|g| {
                let variant = Classifier::ContainsLazy.classify(&g.dir.to_string_lossy());
                GroupSummary::new(g, Some(variant))
            })
            .collect::<Result<Vec<_>, _>>()?;
        print_summaries(summaries.iter());

        let series = split_by_variant(&groups, Classifier::ContainsLazy)?;
        // runs come in lazy/non-lazy pairs sharing a label
        let tick_labels = groups
            .iter()
            .step_by(2)
            .map(|g| g.name.clone())
            .collect::<Vec<_>>();
        let chart = grouped_variant_chart(
            &series,
            &tick_labels,
            "Cache size limit",
            Y_LABEL,
            settings.cache.miss_headroom,
        )?;
        Ok(vec![emit_chart(
            settings,
            "swiftlinks-cache-misses",
            &chart,
            &summaries,
        )?])
    }
}

/// Cache misses of one series of runs per query cache time.
#[derive(Debug, Default, Clone)]
pub struct QueryCacheMisses;

impl Plot for QueryCacheMisses {
    fn name(&self) -> &'static str {
        "query-cache-misses"
    }

    fn plot(&self, runs: &[RunDir], settings: &Settings) -> Result<Vec<PathBuf>> {
        let summaries = read_misses(runs, settings)?
            .iter()
            .map(|g| GroupSummary::new(g, None))
            .collect::<Result<Vec<_>, _>>()?;
        print_summaries(summaries.iter());

        let chart = single_series_chart(&summaries, "Query cache time", Y_LABEL, 0.0);
        Ok(vec![emit_chart(
            settings,
            "swiftlinks-cache-misses-query-cache",
            &chart,
            &summaries,
        )?])
    }
}
