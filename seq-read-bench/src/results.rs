use std::{
    fs::File,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    config::MIB,
    error::{BenchError, Result},
    util::{close_checked, write_once},
};

pub const CSV_HEADER: &str = "chunk_size,run_number,read_time_ms,throughput_mbps\n";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchmarkResult {
    pub chunk_size: usize,
    /// 1-based, restarts for every chunk size.
    pub run_number: u32,
    pub read_time_ms: f64,
    /// MiB per second.
    pub throughput_mbps: f64,
}

impl BenchmarkResult {
    pub fn from_elapsed(
        chunk_size: usize,
        run_number: u32,
        total_size: u64,
        elapsed: Duration,
    ) -> Self {
        let read_time_ms = elapsed.as_secs_f64() * 1000.0;
        let throughput_mbps = (total_size as f64 / MIB as f64) / (read_time_ms / 1000.0);
        BenchmarkResult {
            chunk_size,
            run_number,
            read_time_ms,
            throughput_mbps,
        }
    }

    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{:.3},{:.3}\n",
            self.chunk_size, self.run_number, self.read_time_ms, self.throughput_mbps
        )
    }
}

/// The CSV output. Created (truncating) once per sweep, every row goes straight to
/// the fd so completed runs survive an abort later in the sweep.
pub struct ResultsFile {
    file: File,
    path: PathBuf,
    rows: u64,
}

impl ResultsFile {
    pub fn create(path: &Path) -> Result<Self> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(path)
            .map_err(BenchError::io("create", path))?;
        write_once(&mut file, path, CSV_HEADER.as_bytes())?;
        Ok(ResultsFile {
            file,
            path: path.to_owned(),
            rows: 0,
        })
    }

    pub fn append(&mut self, result: &BenchmarkResult) -> Result<()> {
        write_once(&mut self.file, &self.path, result.csv_row().as_bytes())?;
        self.rows += 1;
        Ok(())
    }

    /// Returns the number of rows written, not counting the header.
    pub fn close(self) -> Result<u64> {
        close_checked(self.file, &self.path)?;
        Ok(self.rows)
    }
}
