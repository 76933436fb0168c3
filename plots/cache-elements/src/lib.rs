use std::path::PathBuf;

use common::{
    classify::Classifier,
    config::Settings,
    locate::FileQuery,
    parse::{CounterMode, read_counter_log},
    plot::{Plot, RunDir, collect_samples, emit_chart},
    render::grouped_variant_chart,
    stats::{GroupSummary, split_by_variant},
};
use eyre::Result;
use tracing::debug;

const ELEMENTS_FILE: &str = "size-elements-poll";
const SCOUT_DIR: &str = "scout-";
/// Sample of a poll file without records
const NO_ELEMENTS: f64 = -1.0;

/// Peak number of cached elements per scout, lazy against non-lazy.
#[derive(Debug, Default, Clone)]
pub struct CacheElements;

impl Plot for CacheElements {
    fn name(&self) -> &'static str {
        "cache-elements"
    }

    fn plot(&self, runs: &[RunDir], settings: &Settings) -> Result<Vec<PathBuf>> {
        let query = FileQuery::exact(ELEMENTS_FILE).within(SCOUT_DIR);
        let groups = collect_samples(runs, &query, |path| {
            let peak = read_counter_log(path, CounterMode::Max)?;
            debug!("{}: peak {peak:?}", path.display());
            Ok(peak.map_or(NO_ELEMENTS, |max| max as f64))
        })?;

        let classifier = Classifier::ContainsLazy;
        let mut summaries = Vec::with_capacity(groups.len());
        for group in &groups {
            let variant = classifier.classify(&group.dir.to_string_lossy());
            let summary = GroupSummary::new(group, Some(variant))?;
            println!("{}: {}", summary.name, summary.summary);
            summaries.push(summary);
        }

        let series = split_by_variant(&groups, classifier)?;
        let tick_labels = groups
            .iter()
            .step_by(2)
            .map(|g| g.name.clone())
            .collect::<Vec<_>>();
        let chart = grouped_variant_chart(
            &series,
            &tick_labels,
            "Cache size limit",
            "Number of elements",
            settings.cache.elements_headroom,
        )?;
        Ok(vec![emit_chart(
            settings,
            "swiftlinks-cache-elements",
            &chart,
            &summaries,
        )?])
    }
}
