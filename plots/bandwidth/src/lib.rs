use std::path::PathBuf;

use common::{
    classify::{Classifier, Variant},
    config::Settings,
    locate::{FileQuery, find_files},
    parse::read_bandwidth_log,
    plot::{Plot, RunDir, emit_chart},
    render::{Bar, BarAlign, BarChart, BarSeries, YRange, variant_colors},
    stats::{SampleGroup, split_by_variant},
};
use eyre::{Context, Result};
use tracing::debug;

/// Fetch reply bandwidth of lazy and non-lazy clients, during startup and
/// right after it.
#[derive(Debug, Default, Clone)]
pub struct Bandwidth;

impl Plot for Bandwidth {
    fn name(&self) -> &'static str {
        "bandwidth"
    }

    fn plot(&self, runs: &[RunDir], settings: &Settings) -> Result<Vec<PathBuf>> {
        let windows = settings.bandwidth.windows();
        let query = FileQuery::suffix(".log");

        let mut startup = Vec::with_capacity(runs.len());
        let mut after = Vec::with_capacity(runs.len());
        for run in runs {
            let mut startup_samples = Vec::new();
            let mut after_samples = Vec::new();
            for file in find_files(&run.path, &query)? {
                let sample = read_bandwidth_log(&file, windows)
                    .with_context(|| format!("Reading bandwidth log {}", file.display()))?;
                debug!("{}: {sample:?}", file.display());
                startup_samples.push(sample.startup);
                after_samples.push(sample.after);
            }
            startup.push(SampleGroup {
                name: run.label(),
                dir: run.path.clone(),
                samples: startup_samples,
            });
            after.push(SampleGroup {
                name: run.label(),
                dir: run.path.clone(),
                samples: after_samples,
            });
        }

        // both phases are reported per startup window length
        let window = windows.startup as f64;
        let startup_stem = format!("swiftlinks-bandwidth-startup-{}", windows.startup);
        let after_stem = format!(
            "swiftlinks-bandwidth-after-{}-{}",
            windows.startup, windows.after
        );
        Ok(vec![
            self.phase_chart(
                &startup,
                window,
                settings.bandwidth.startup_y_max,
                &startup_stem,
                settings,
            )?,
            self.phase_chart(
                &after,
                window,
                settings.bandwidth.after_y_max,
                &after_stem,
                settings,
            )?,
        ])
    }
}

impl Bandwidth {
    fn phase_chart(
        &self,
        groups: &[SampleGroup],
        window: f64,
        y_max: f64,
        stem: &str,
        settings: &Settings,
    ) -> Result<PathBuf> {
        let rates = groups
            .iter()
            .map(|g| g.map(|bytes| bytes / window))
            .collect::<Vec<_>>();
        for group in &rates {
            let summary = group.summarize()?;
            println!("{summary}");
        }

        let series = split_by_variant(&rates, Classifier::ContainsNonLazy)?;
        let bars = [Variant::Lazy, Variant::NonLazy]
            .into_iter()
            .enumerate()
            .map(|(x, variant)| -> Result<BarSeries> {
                let group = series.last(variant)?;
                let (color, error_color) = variant_colors(variant);
                Ok(BarSeries {
                    label: None,
                    error_color,
                    bars: vec![Bar {
                        x: x as f64,
                        mean: group.summary.mean,
                        std_dev: group.summary.std_dev,
                        color,
                    }],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let chart = BarChart {
            series: bars,
            bar_width: 0.5,
            align: BarAlign::Center,
            x_range: (-0.5, 1.5),
            y_range: YRange::Fixed(0.0, y_max),
            ticks: vec![
                (0.0, Variant::Lazy.label().to_owned()),
                (1.0, Variant::NonLazy.label().to_owned()),
            ],
            x_label: None,
            y_label: "Bandwidth (KB/s)".to_owned(),
            annotate: true,
        };
        let groups = series.all().cloned().collect::<Vec<_>>();
        Ok(emit_chart(settings, stem, &chart, &groups)?)
    }
}
