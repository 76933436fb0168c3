use std::{fs, path::Path};

use bandwidth::Bandwidth;
use common::{
    config::Settings,
    plot::{Plot, RunDir},
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn client_log(startup_bytes: i64, after_bytes: i64) -> String {
    format!(
        "; client log\n\
         x,INIT,x,0\n\
         x,100,METADATA_FetchObjectVersionReply,{startup_bytes}\n\
         x,40000,METADATA_FetchObjectVersionReply,{after_bytes}\n\
         x,95000,METADATA_FetchObjectVersionReply,999999\n"
    )
}

fn settings(root: &Path) -> Settings {
    Settings {
        output_dir: root.join("out"),
        ..Settings::default()
    }
}

fn means(path: &Path) -> Vec<f64> {
    let data: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    data.as_array()
        .unwrap()
        .iter()
        .map(|g| g["mean"].as_f64().unwrap())
        .collect()
}

#[test]
fn writes_startup_and_after_charts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "bw-lazy/c1/client-TH-2.log", &client_log(60_000, 120_000));
    write(root, "bw-lazy/c2/client-TH-2.log", &client_log(180_000, 120_000));
    write(root, "bw-nonlazy/c1/client-TH-4.log", &client_log(1_200_000, 0));

    let settings = settings(root);
    let runs = vec![
        RunDir::unnamed(root.join("bw-lazy")),
        RunDir::unnamed(root.join("bw-nonlazy")),
    ];
    let written = common::plot::plot(&Bandwidth, &runs, &settings).unwrap();

    assert_eq!(
        written,
        vec![
            settings.output_path("swiftlinks-bandwidth-startup-30000"),
            settings.output_path("swiftlinks-bandwidth-after-30000-60000"),
        ]
    );
    for path in &written {
        assert!(fs::read(path).unwrap().starts_with(b"%PDF"));
        assert!(
            fs::read_to_string(path.with_extension("svg"))
                .unwrap()
                .contains("Bandwidth (KB/s)")
        );
    }

    // (30000 + 90000) / 2 bytes per thread over 30000 ms, then 300000 / 30000
    let data = settings.plot_data_dir();
    assert_eq!(
        means(&data.join("swiftlinks-bandwidth-startup-30000.json")),
        vec![2.0, 10.0]
    );
    assert_eq!(
        means(&data.join("swiftlinks-bandwidth-after-30000-60000.json")),
        vec![2.0, 0.0]
    );
}

#[test]
fn both_variants_are_required() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "bw-lazy/client-TH-1.log", &client_log(1, 1));
    let runs = vec![RunDir::unnamed(root.join("bw-lazy"))];
    let err = Bandwidth.plot(&runs, &settings(root)).unwrap_err();
    assert!(err.to_string().contains("Non-lazy"));
}

#[test]
fn log_without_thread_count_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "bw-lazy/client.log", &client_log(1, 1));
    write(root, "bw-nonlazy/client-TH-1.log", &client_log(1, 1));
    let runs = vec![
        RunDir::unnamed(root.join("bw-lazy")),
        RunDir::unnamed(root.join("bw-nonlazy")),
    ];
    let err = Bandwidth.plot(&runs, &settings(root)).unwrap_err();
    assert!(format!("{err:#}").contains("TH-"));
}
