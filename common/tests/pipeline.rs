use std::{fs, path::Path};

use common::{
    classify::{Classifier, Variant},
    error::AnalysisError,
    locate::{FileQuery, find_files},
    parse::{CounterMode, read_counter_log},
    plot::{RunDir, collect_samples},
    stats::split_by_variant,
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn miss_tree(root: &Path) {
    write(
        root,
        "cache-100-lazy/scout-1/miss-no-object-count",
        "10000;5\n30000;7\n40000;3\n",
    );
    write(root, "cache-100-lazy/scout-2/miss-no-object-count", "30000;2\n");
    write(root, "cache-100-lazy/dc-1/miss-no-object-count", "30000;100\n");
    write(root, "cache-100-nonlazy/scout-1/miss-no-object-count", "30000;4\n");
    write(root, "cache-100-nonlazy/scout-1/size-elements-poll", "0;9\n");
}

fn misses(runs: &[RunDir]) -> Vec<common::stats::SampleGroup> {
    let query = FileQuery::exact("miss-no-object-count").within("scout-");
    collect_samples(runs, &query, |path| {
        Ok(read_counter_log(path, CounterMode::SumFrom(30_000))?.unwrap_or_default() as f64)
    })
    .unwrap()
}

#[test]
fn locator_is_sorted_and_gated() {
    let dir = tempfile::tempdir().unwrap();
    miss_tree(dir.path());
    let query = FileQuery::exact("miss-no-object-count").within("scout-");
    let found = find_files(&dir.path().join("cache-100-lazy"), &query).unwrap();
    let rel: Vec<_> = found
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        rel,
        vec![
            Path::new("cache-100-lazy/scout-1/miss-no-object-count"),
            Path::new("cache-100-lazy/scout-2/miss-no-object-count"),
        ]
    );
}

#[cfg(unix)]
#[test]
fn symlinked_files_are_found_but_linked_dirs_are_not_walked() {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "logs/client-TH-1.log", "x,INIT,x,0\n");
    write(root, "shared/nested/client-TH-2.log", "x,INIT,x,0\n");
    fs::create_dir_all(root.join("bw-lazy")).unwrap();
    symlink(
        root.join("logs/client-TH-1.log"),
        root.join("bw-lazy/client-TH-1.log"),
    )
    .unwrap();
    symlink(root.join("shared"), root.join("bw-lazy/shared")).unwrap();

    let found = find_files(&root.join("bw-lazy"), &FileQuery::suffix(".log")).unwrap();
    assert_eq!(found, vec![root.join("bw-lazy/client-TH-1.log")]);
}

#[test]
fn missing_root_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let found = find_files(&dir.path().join("absent"), &FileQuery::suffix(".log")).unwrap();
    assert!(found.is_empty());
}

#[test]
fn miss_counts_are_split_by_variant() {
    let dir = tempfile::tempdir().unwrap();
    miss_tree(dir.path());
    let runs = vec![
        RunDir {
            name: Some("100".to_owned()),
            path: dir.path().join("cache-100-lazy"),
        },
        RunDir {
            name: Some("100".to_owned()),
            path: dir.path().join("cache-100-nonlazy"),
        },
    ];
    let groups = misses(&runs);
    assert_eq!(groups[0].samples, vec![10.0, 2.0]);
    assert_eq!(groups[1].samples, vec![4.0]);

    let series = split_by_variant(&groups, Classifier::ContainsLazy).unwrap();
    let lazy = series.last(Variant::Lazy).unwrap();
    assert_eq!(lazy.summary.mean, 6.0);
    assert_eq!(lazy.summary.std_dev, 4.0);
    assert_eq!(series.last(Variant::NonLazy).unwrap().summary.mean, 4.0);
}

#[test]
fn reruns_give_identical_aggregates() {
    let dir = tempfile::tempdir().unwrap();
    miss_tree(dir.path());
    let runs = vec![RunDir::unnamed(dir.path().join("cache-100-lazy"))];
    let first = split_by_variant(&misses(&runs), Classifier::ContainsLazy).unwrap();
    let second = split_by_variant(&misses(&runs), Classifier::ContainsLazy).unwrap();
    assert_eq!(first, second);
}

#[test]
fn run_without_matching_files_has_no_samples() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("empty-lazy")).unwrap();
    let runs = vec![RunDir {
        name: Some("empty".to_owned()),
        path: dir.path().join("empty-lazy"),
    }];
    let err = split_by_variant(&misses(&runs), Classifier::ContainsLazy).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptySampleSet { group } if group == "empty"));
}
