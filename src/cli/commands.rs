use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::Parser;

use py_ingest::error::Result;
use py_ingest::facts::NdjsonSink;
use py_ingest::indexer::{ingest_directory, RunStats};
use py_ingest::IngestOptions;

#[derive(Parser, Debug)]
#[command(name = "py-ingest")]
#[command(about = "Extract declarations, imports and calls from Python sources as NDJSON facts")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Ingest a project, one fact per line on stdout
    py-ingest ./src > facts.ndjson

    # Use every core and skip virtualenvs
    py-ingest . --jobs 0 --exclude venv --exclude .venv

    # Honor .gitignore and show skipped files
    RUST_LOG=py_ingest=debug py-ingest . --respect-gitignore
"#)]
pub struct Cli {
    /// Directory to ingest
    pub root: PathBuf,

    /// Worker threads (0 = one per core)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Additional directory names to skip (node_modules and .git always are)
    #[arg(long, value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Skip files matched by .gitignore and .ignore files
    #[arg(long)]
    pub respect_gitignore: bool,
}

impl Cli {
    pub fn options(&self) -> IngestOptions {
        IngestOptions::new(&self.root)
            .with_jobs(self.jobs)
            .with_excluded_dirs(self.exclude.iter().cloned())
            .with_ignore_files(self.respect_gitignore)
    }
}

/// Writes the fact stream for `cli.root` to stdout
pub fn ingest(cli: &Cli) -> Result<RunStats> {
    let options = cli.options();
    let mut sink = NdjsonSink::new(BufWriter::new(io::stdout()));
    ingest_directory(&options, &mut sink)
}
