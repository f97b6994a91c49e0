use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is not valid UTF-8: {0}")]
    Decode(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Grammar error: {0}")]
    Grammar(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Not a directory: {0}")]
    InvalidRoot(PathBuf),
}

pub type Result<T> = std::result::Result<T, IngestError>;
