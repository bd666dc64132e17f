use std::{collections::TryReserveError, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BenchError>;

/// Every variant is fatal: the benchmark never retries and never salvages a partial sweep.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("could not {op} {path:?}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not allocate {chunk_size} byte chunk buffer: {source}")]
    Alloc {
        chunk_size: usize,
        source: TryReserveError,
    },
    #[error(
        "could not read entire file: chunk_size={chunk_size} run={run_number} read {actual} of {expected} bytes"
    )]
    IncompleteRead {
        chunk_size: usize,
        run_number: u32,
        expected: u64,
        actual: u64,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("could not serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BenchError {
    /// For use with `map_err`, e.g. `File::open(p).map_err(BenchError::io("open", p))`.
    pub fn io<P: Into<PathBuf>>(op: &'static str, path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BenchError::Io { op, path, source }
    }
}
