//! Per-file ingestion.
//!
//! A file is read and parsed completely before the first fact is emitted,
//! so a file either contributes its whole set of facts or nothing. The
//! module symbol always comes first and the name index always comes last.

use std::path::Path;

use crate::error::{IngestError, Result};
use crate::facts::{FactSink, Symbol};
use crate::indexer::emitter::{FactEmitter, FileSummary};
use crate::indexer::extractor;
use crate::indexer::parser::{ParsedFile, Parser};

/// What happened to one file
#[derive(Debug)]
pub enum Outcome {
    Ingested(FileSummary),
    /// Unreadable, undecodable or unparsable; nothing was emitted
    Skipped(IngestError),
}

pub struct FileIngestor {
    parser: Parser,
}

impl FileIngestor {
    pub fn new(parser: Parser) -> Self {
        Self { parser }
    }

    /// Ingests `source` as the file named `file`. A parse failure is
    /// returned as an error before anything reaches `sink`.
    pub fn ingest_source(
        &self,
        file: &str,
        source: &str,
        sink: &mut dyn FactSink,
    ) -> Result<FileSummary> {
        let parsed = self.parser.parse_source(source)?;
        emit_file(&parsed, file, sink)
    }

    /// Ingests the file at `path`, named relative to `root`. Read, decode
    /// and parse failures skip the file; only sink failures are errors.
    pub fn ingest_path(
        &self,
        root: &Path,
        path: &Path,
        sink: &mut dyn FactSink,
    ) -> Result<Outcome> {
        let file = relative_name(root, path);

        let parsed = match self.parser.parse_file(path) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
                return Ok(Outcome::Skipped(e));
            }
        };

        let summary = emit_file(&parsed, &file, sink)?;
        tracing::trace!(
            "Ingested {}: {} symbols, {} edges, {} calls",
            file,
            summary.symbols,
            summary.edges,
            summary.calls
        );
        Ok(Outcome::Ingested(summary))
    }
}

impl Default for FileIngestor {
    fn default() -> Self {
        Self::new(Parser::python())
    }
}

/// Emits every fact of an already parsed file
pub fn emit_file(
    parsed: &ParsedFile,
    file: &str,
    sink: &mut dyn FactSink,
) -> Result<FileSummary> {
    let mut emitter = FactEmitter::new(sink);

    let module = Symbol::module(file, parsed.language);
    let module_id = module.id.clone();
    emitter.symbol(module)?;

    let names = extractor::extract(
        &parsed.module,
        &module_id,
        file,
        parsed.language,
        &mut emitter,
    )?;
    emitter.name_index(names)?;

    Ok(emitter.finish())
}

/// Path of `path` relative to `root`, with `/` separators
pub fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}
