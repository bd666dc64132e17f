use std::{fs::File, io::Read, path::Path, time::Instant};

use tracing::{debug, info, warn};

use crate::{
    config::SweepConfig,
    error::{BenchError, Result},
    results::{BenchmarkResult, ResultsFile},
    summary::{ChunkStats, SweepReport},
    util::close_checked,
};


/// Times full sequential reads of the test file, one CSV row per run.
pub struct ReadBenchmarkRunner<'a> {
    config: &'a SweepConfig,
}

impl<'a> ReadBenchmarkRunner<'a> {
    pub fn new(config: &'a SweepConfig) -> Self {
        ReadBenchmarkRunner { config }
    }

    pub fn run_sweep(&self) -> Result<SweepReport> {
        let config = self.config;
        config.validate()?;
        let start = Instant::now();

        let mut results = ResultsFile::create(&config.results)?;
        self.check_test_file_size();

        info!(
            repetitions = config.repetitions,
            total_size = config.total_size,
            "Starting sequential read benchmark over {} chunk sizes",
            config.chunk_sizes.len()
        );
        let mut chunks = Vec::with_capacity(config.chunk_sizes.len());
        for &chunk_size in &config.chunk_sizes {
            info!("Testing reads of {chunk_size} bytes");
            let mut buf = alloc_chunk_buffer(chunk_size)?;
            let mut stats = ChunkStats::new(chunk_size);
            for run_number in 1..=config.repetitions {
                let result = self.run_once(run_number, &mut buf)?;
                results.append(&result)?;
                stats.record(&result);
            }
            let summary = stats.summarize();
            info!("{summary}");
            chunks.push(summary);
        }
        let rows_written = results.close()?;

        Ok(SweepReport {
            config: config.clone(),
            elapsed_us: start.elapsed(),
            rows_written,
            chunks,
        })
    }

    /// One timed pass over the test file using `buf.len()` sized reads.
    pub fn run_once(&self, run_number: u32, buf: &mut [u8]) -> Result<BenchmarkResult> {
        let chunk_size = buf.len();
        let total_size = self.config.total_size;
        let path = self.config.test_file.as_path();

        let mut file = File::open(path).map_err(BenchError::io("open", path))?;

        let start = Instant::now();
        let total_read = read_up_to(&mut file, buf, total_size);
        let elapsed = start.elapsed();

        close_checked(file, path)?;
        debug!(chunk_size, run_number, "read {total_read} bytes in {elapsed:?}");

        if total_read != total_size {
            return Err(BenchError::IncompleteRead {
                chunk_size,
                run_number,
                expected: total_size,
                actual: total_read,
            });
        }
        Ok(BenchmarkResult::from_elapsed(chunk_size, run_number, total_size, elapsed))
    }

    fn check_test_file_size(&self) {
        let path = &self.config.test_file;
        match std::fs::metadata(path) {
            Ok(md) if md.len() != self.config.total_size => warn!(
                "test file {:?} is {} bytes, expected {}",
                path,
                md.len(),
                self.config.total_size
            ),
            Ok(_) => {}
            // the first run reports it
            Err(e) => warn!("cannot stat test file {:?}: {}", path, e),
        }
    }
}

/// Sequential reads of at most `buf.len()` bytes until `total_size` bytes were read,
/// EOF, or a failed read. Returns the number of bytes read.
fn read_up_to(file: &mut File, buf: &mut [u8], total_size: u64) -> u64 {
    let mut total_read: u64 = 0;
    while total_read < total_size {
        let to_read = (total_size - total_read).min(buf.len() as u64) as usize;
        match file.read(&mut buf[..to_read]) {
            Ok(0) => break,
            Ok(n) => total_read += n as u64,
            Err(e) => {
                warn!("read failed after {total_read} bytes: {e}");
                break;
            }
        }
    }
    total_read
}

fn alloc_chunk_buffer(chunk_size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(chunk_size)
        .map_err(|source| BenchError::Alloc { chunk_size, source })?;
    buf.resize(chunk_size, 0);
    Ok(buf)
}

pub fn run_and_report(config: &SweepConfig, summary_json: Option<&Path>) -> Result<()> {
    let report = ReadBenchmarkRunner::new(config).run_sweep()?;
    if let Some(path) = summary_json {
        info!("writing summary to {:?}", path);
        report.write_json(path)?;
    }
    info!(
        "Benchmark completed in {}. {} results saved to {:?}",
        humantime::format_duration(round_to_millis(report.elapsed_us)),
        report.rows_written,
        config.results
    );
    Ok(())
}

fn round_to_millis(d: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_millis(d.as_millis() as u64)
}
