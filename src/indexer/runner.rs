use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::config::IngestOptions;
use crate::error::{IngestError, Result};
use crate::facts::{Fact, FactSink};
use crate::indexer::emitter::FileSummary;
use crate::indexer::ingest::{FileIngestor, Outcome};
use crate::indexer::walker::FileWalker;

/// Stack for pool workers. Lowering and visiting recurse once per nested
/// definition or call, up to the lowering's nesting limit.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Totals for a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub files_ingested: usize,
    pub files_skipped: usize,
    pub symbols: usize,
    pub edges: usize,
    pub calls: usize,
}

impl RunStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Ingested(summary) => self.add(summary),
            Outcome::Skipped(_) => self.files_skipped += 1,
        }
    }

    fn add(&mut self, summary: &FileSummary) {
        self.files_ingested += 1;
        self.symbols += summary.symbols;
        self.edges += summary.edges;
        self.calls += summary.calls;
    }

    /// Facts written, name indexes included
    pub fn facts(&self) -> usize {
        self.symbols + self.edges + self.calls + self.files_ingested
    }
}

/// Walks `options.root` and ingests every source file into `sink`
pub fn ingest_directory<S>(options: &IngestOptions, sink: &mut S) -> Result<RunStats>
where
    S: FactSink + Send,
{
    let root = options.root.as_path();
    if !root.is_dir() {
        return Err(IngestError::InvalidRoot(root.to_path_buf()));
    }

    let walker = FileWalker::python()
        .with_excluded_dirs(options.excluded_dirs.clone())
        .with_ignore_files(options.respect_ignore_files);
    let files = walker.walk(root)?;
    tracing::debug!("Found {} files under {}", files.len(), root.display());

    let ingestor = FileIngestor::default();
    let stats = if options.jobs == 1 {
        ingest_sequential(&ingestor, root, &files, sink)?
    } else {
        ingest_parallel(&ingestor, root, &files, options.jobs, sink)?
    };
    sink.flush()?;

    tracing::info!(
        "Ingested {} files ({} skipped): {} symbols, {} edges, {} calls",
        stats.files_ingested,
        stats.files_skipped,
        stats.symbols,
        stats.edges,
        stats.calls
    );
    Ok(stats)
}

fn ingest_sequential<S: FactSink>(
    ingestor: &FileIngestor,
    root: &Path,
    files: &[PathBuf],
    sink: &mut S,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    for file in files {
        let outcome = ingestor.ingest_path(root, file, sink)?;
        stats.record(&outcome);
    }
    Ok(stats)
}

struct Shared<'s, S> {
    sink: &'s mut S,
    stats: RunStats,
}

/// Each worker buffers one file's facts and writes them as a single batch,
/// so files never interleave inside the stream.
fn ingest_parallel<S: FactSink + Send>(
    ingestor: &FileIngestor,
    root: &Path,
    files: &[PathBuf],
    jobs: usize,
    sink: &mut S,
) -> Result<RunStats> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .stack_size(WORKER_STACK_SIZE)
        .build()?;
    let shared = Mutex::new(Shared {
        sink,
        stats: RunStats::default(),
    });

    pool.install(|| {
        files.par_iter().try_for_each(|file| -> Result<()> {
            let mut batch: Vec<Fact> = Vec::new();
            let outcome = ingestor.ingest_path(root, file, &mut batch)?;

            let mut guard = shared.lock().unwrap_or_else(|p| p.into_inner());
            for fact in batch {
                guard.sink.emit(fact)?;
            }
            guard.stats.record(&outcome);
            Ok(())
        })
    })?;

    let shared = shared.into_inner().unwrap_or_else(|p| p.into_inner());
    Ok(shared.stats)
}
