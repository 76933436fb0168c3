use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::parse::BandwidthWindows;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bandwidth: BandwidthSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BandwidthSettings {
    pub startup_window: i64,
    pub after_window: i64,
    pub startup_y_max: f64,
    pub after_y_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Misses before this time are warm-up and not counted
    pub miss_start_offset: i64,
    pub miss_headroom: f64,
    pub elements_headroom: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/tmp/sosp"),
            width: 640,
            height: 480,
            bandwidth: BandwidthSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Default for BandwidthSettings {
    fn default() -> Self {
        let windows = BandwidthWindows::default();
        Self {
            startup_window: windows.startup,
            after_window: windows.after,
            startup_y_max: 250.0,
            after_y_max: 220.0,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            miss_start_offset: 30_000,
            miss_headroom: 30.0,
            elements_headroom: 10.0,
        }
    }
}

impl BandwidthSettings {
    pub fn windows(&self) -> BandwidthWindows {
        BandwidthWindows {
            startup: self.startup_window,
            after: self.after_window,
        }
    }
}

impl Settings {
    /// Reads settings from a YAML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Parsing {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yml::from_str(content)?)
    }

    /// PDF chart path, the SVG source is written next to it
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.pdf"))
    }

    pub fn plot_data_dir(&self) -> PathBuf {
        self.output_dir.join("plot_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml(
            "output_dir: /tmp/out\nbandwidth:\n  startup_window: 10000\n",
        )
        .unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(settings.bandwidth.startup_window, 10_000);
        assert_eq!(settings.bandwidth.after_window, 60_000);
        assert_eq!(settings.cache, CacheSettings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_yaml("colour: red\n").is_err());
    }

    #[test]
    fn output_paths() {
        let settings = Settings::default();
        assert_eq!(
            settings.output_path("swiftlinks-cache-misses"),
            PathBuf::from("/tmp/sosp/swiftlinks-cache-misses.pdf")
        );
        assert_eq!(settings.plot_data_dir(), PathBuf::from("/tmp/sosp/plot_data"));
    }
}
