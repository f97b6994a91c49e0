use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;

use crate::config::DEFAULT_EXCLUDED_DIRS;
use crate::error::Result;
use crate::languages::{LanguageGrammar, PythonGrammar};

pub struct FileWalker {
    grammar: Arc<dyn LanguageGrammar>,
    excluded_dirs: Vec<String>,
    respect_ignore_files: bool,
}

impl FileWalker {
    pub fn new(grammar: Arc<dyn LanguageGrammar>) -> Self {
        Self {
            grammar,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            respect_ignore_files: false,
        }
    }

    pub fn python() -> Self {
        Self::new(Arc::new(PythonGrammar))
    }

    pub fn with_excluded_dirs(mut self, names: Vec<String>) -> Self {
        self.excluded_dirs = names;
        self
    }

    pub fn with_ignore_files(mut self, respect: bool) -> Self {
        self.respect_ignore_files = respect;
        self
    }

    /// Source files under `root`, sorted by path within each directory
    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let excluded = self.excluded_dirs.clone();
        let respect = self.respect_ignore_files;

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .parents(respect)
            .ignore(respect)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir
                    && entry.depth() > 0
                    && excluded.iter().any(|name| entry.file_name() == OsStr::new(name)))
            })
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && self.is_supported(path) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => tracing::debug!("Skipping unreadable entry: {}", e),
            }
        }

        Ok(files)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.grammar.supports(path)
    }
}

impl Default for FileWalker {
    fn default() -> Self {
        Self::python()
    }
}
