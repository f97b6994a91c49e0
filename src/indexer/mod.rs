pub mod ast;
pub mod calls;
pub mod emitter;
pub mod extractor;
pub mod identity;
pub mod imports;
pub mod ingest;
pub mod parser;
pub mod runner;
pub mod walker;

pub use emitter::FileSummary;
pub use identity::stable_id;
pub use ingest::{emit_file, relative_name, FileIngestor, Outcome};
pub use parser::{ParsedFile, Parser};
pub use runner::{ingest_directory, RunStats};
pub use walker::FileWalker;
