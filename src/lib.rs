pub mod config;
pub mod error;
pub mod facts;
pub mod indexer;
pub mod languages;

pub use config::{IngestOptions, DEFAULT_EXCLUDED_DIRS};
pub use error::{IngestError, Result};
pub use facts::{
    CallFact, Edge, EdgeKind, Fact, FactSink, NameIndex, NdjsonSink, Position, Range, Symbol,
    SymbolKind,
};
pub use indexer::{
    ingest_directory, stable_id, FileIngestor, FileSummary, FileWalker, Outcome, ParsedFile,
    Parser, RunStats,
};
pub use languages::{LanguageGrammar, PythonGrammar};
