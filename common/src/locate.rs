use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Exact(String),
    Suffix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub name: NameMatch,
    /// Substring the containing directory path must have
    pub parent_contains: Option<String>,
}

impl FileQuery {
    pub fn exact(name: &str) -> Self {
        Self {
            name: NameMatch::Exact(name.to_owned()),
            parent_contains: None,
        }
    }

    pub fn suffix(suffix: &str) -> Self {
        Self {
            name: NameMatch::Suffix(suffix.to_owned()),
            parent_contains: None,
        }
    }

    pub fn within(mut self, parent_contains: &str) -> Self {
        self.parent_contains = Some(parent_contains.to_owned());
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|x| x.to_str()) else {
            return false;
        };
        let name_ok = match &self.name {
            NameMatch::Exact(name) => file_name == name,
            NameMatch::Suffix(suffix) => file_name.ends_with(suffix.as_str()),
        };
        if !name_ok {
            return false;
        }
        match &self.parent_contains {
            Some(needle) => path
                .parent()
                .is_some_and(|p| p.to_string_lossy().contains(needle.as_str())),
            None => true,
        }
    }
}

/// Every file below `root` matching `query`, sorted by name at each level.
pub fn find_files(root: &Path, query: &FileQuery) -> Result<Vec<PathBuf>, AnalysisError> {
    if let Err(err) = root.metadata() {
        if err.kind() == ErrorKind::NotFound {
            warn!("Run directory {} does not exist", root.display());
            return Ok(Vec::new());
        }
        return Err(AnalysisError::io(root, err));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        // follows file symlinks, linked directories are not descended into
        if entry.path().is_file() && query.matches(entry.path()) {
            debug!("Found {}", entry.path().display());
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
