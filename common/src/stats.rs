use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    classify::{Classifier, Variant},
    error::AnalysisError,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// `<mean> <std>`, floats always carry a decimal point
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.mean, self.std_dev)
    }
}

/// Mean and population standard deviation of `samples`.
pub fn summarize(group: &str, samples: &[f64]) -> Result<Summary, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptySampleSet {
            group: group.to_owned(),
        });
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Ok(Summary {
        mean,
        std_dev: variance.sqrt(),
    })
}

/// Per-file scalars collected from one run directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleGroup {
    pub name: String,
    pub dir: PathBuf,
    pub samples: Vec<f64>,
}

impl SampleGroup {
    pub fn summarize(&self) -> Result<Summary, AnalysisError> {
        summarize(&self.name, &self.samples)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            name: self.name.clone(),
            dir: self.dir.clone(),
            samples: self.samples.iter().copied().map(f).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub variant: Option<Variant>,
    pub samples: Vec<f64>,
    #[serde(flatten)]
    pub summary: Summary,
}

impl GroupSummary {
    pub fn new(group: &SampleGroup, variant: Option<Variant>) -> Result<Self, AnalysisError> {
        Ok(Self {
            name: group.name.clone(),
            variant,
            samples: group.samples.clone(),
            summary: group.summarize()?,
        })
    }
}

/// Group summaries routed by variant, each side in argument order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VariantSeries {
    pub lazy: Vec<GroupSummary>,
    pub non_lazy: Vec<GroupSummary>,
}

impl VariantSeries {
    pub fn get(&self, variant: Variant) -> &[GroupSummary] {
        match variant {
            Variant::Lazy => &self.lazy,
            Variant::NonLazy => &self.non_lazy,
        }
    }

    /// The last group of `variant`, which is what a single-bar chart shows.
    pub fn last(&self, variant: Variant) -> Result<&GroupSummary, AnalysisError> {
        self.get(variant)
            .last()
            .ok_or(AnalysisError::MissingVariant(variant))
    }

    /// Groups of both variants, lazy first.
    pub fn all(&self) -> impl Iterator<Item = &GroupSummary> {
        self.lazy.iter().chain(self.non_lazy.iter())
    }
}

pub fn split_by_variant(
    groups: &[SampleGroup],
    classifier: Classifier,
) -> Result<VariantSeries, AnalysisError> {
    let mut series = VariantSeries::default();
    for group in groups {
        let variant = classifier.classify(&group.dir.to_string_lossy());
        let summary = GroupSummary::new(group, Some(variant))?;
        match variant {
            Variant::Lazy => series.lazy.push(summary),
            Variant::NonLazy => series.non_lazy.push(summary),
        }
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, dir: &str, samples: &[f64]) -> SampleGroup {
        SampleGroup {
            name: name.to_owned(),
            dir: PathBuf::from(dir),
            samples: samples.to_vec(),
        }
    }

    #[test]
    fn mean_and_population_std_dev() {
        let s = summarize("g", &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert_eq!(s.mean, 5.0);
        assert!((s.std_dev - 5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_sample_has_no_spread() {
        let s = summarize("g", &[42.0]).unwrap();
        assert_eq!(s.mean, 42.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn summary_prints_whole_numbers_as_floats() {
        let s = summarize("g", &[4.0, 6.0]).unwrap();
        assert_eq!(s.to_string(), "5.0 1.0");
        let s = summarize("g", &[0.1, 0.2]).unwrap();
        assert!(s.to_string().starts_with("0.15000000000000002 "));
    }

    #[test]
    fn empty_group_is_an_error() {
        let err = summarize("cache-100-lazy", &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptySampleSet { group } if group == "cache-100-lazy"));
    }

    #[test]
    fn split_keeps_argument_order() {
        let groups = vec![
            group("100", "r/c100-lazy", &[1.0]),
            group("100", "r/c100-nonlazy", &[2.0]),
            group("200", "r/c200-lazy", &[3.0]),
            group("200", "r/c200-nonlazy", &[4.0]),
        ];
        let series = split_by_variant(&groups, Classifier::ContainsLazy).unwrap();
        let lazy: Vec<f64> = series.lazy.iter().map(|g| g.summary.mean).collect();
        let non_lazy: Vec<f64> = series.non_lazy.iter().map(|g| g.summary.mean).collect();
        assert_eq!(lazy, vec![1.0, 3.0]);
        assert_eq!(non_lazy, vec![2.0, 4.0]);
    }

    #[test]
    fn missing_variant_is_reported() {
        let groups = vec![group("a", "r/bw-lazy", &[1.0])];
        let series = split_by_variant(&groups, Classifier::ContainsNonLazy).unwrap();
        assert_eq!(series.last(Variant::Lazy).unwrap().summary.mean, 1.0);
        assert!(matches!(
            series.last(Variant::NonLazy),
            Err(AnalysisError::MissingVariant(Variant::NonLazy))
        ));
    }
}
