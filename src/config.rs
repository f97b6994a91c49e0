use std::path::{Path, PathBuf};

/// Directory names that are never descended into
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["node_modules", ".git"];

/// Settings for one ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    pub root: PathBuf,
    /// Worker threads. `1` streams facts directly; `0` uses one per core.
    pub jobs: usize,
    pub excluded_dirs: Vec<String>,
    /// Honor `.gitignore` / `.ignore` files while walking
    pub respect_ignore_files: bool,
}

impl IngestOptions {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            jobs: 1,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            respect_ignore_files: false,
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Adds directory names to prune on top of the defaults
    pub fn with_excluded_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.excluded_dirs.contains(&name) {
                self.excluded_dirs.push(name);
            }
        }
        self
    }

    pub fn with_ignore_files(mut self, respect: bool) -> Self {
        self.respect_ignore_files = respect;
        self
    }
}
