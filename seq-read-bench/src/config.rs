use std::path::PathBuf;

use crate::error::{BenchError, Result};

pub const MIB: u64 = 1024 * 1024;

pub const SMALL_CHUNK: usize = 100;
pub const MEDIUM_CHUNK: usize = 1024;
pub const LARGE_CHUNK: usize = 64 * 1024;
pub const INCREMENTAL_STEP: usize = 8 * 1024;
pub const LARGEST_CHUNK: usize = 256 * 1024;

pub const DEFAULT_REPETITIONS: u32 = 30;
pub const DEFAULT_TEST_FILE: &str = "test_file.bin";
pub const DEFAULT_RESULTS_FILE: &str = "benchmark_results.csv";

/// Named chunk-size / file-size presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// 100 B, 1 KiB and 64 KiB chunks over a 1 MiB file.
    SingleLarge,
    /// 100 B, 1 KiB, then 8 KiB up to 256 KiB in 8 KiB steps, over a 64 MiB file.
    Incremental,
}

impl Variant {
    pub fn chunk_sizes(self) -> Vec<usize> {
        let mut sizes = vec![SMALL_CHUNK, MEDIUM_CHUNK];
        match self {
            Variant::SingleLarge => sizes.push(LARGE_CHUNK),
            Variant::Incremental => {
                sizes.extend((INCREMENTAL_STEP..=LARGEST_CHUNK).step_by(INCREMENTAL_STEP))
            }
        }
        sizes
    }

    pub fn total_size(self) -> u64 {
        match self {
            Variant::SingleLarge => MIB,
            Variant::Incremental => 64 * MIB,
        }
    }
}

/// Everything a sweep needs. Built once in `main` and never changed afterwards.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SweepConfig {
    /// Preset the sizes were taken from; flags may have overridden them.
    pub variant: Variant,
    pub chunk_sizes: Vec<usize>,
    pub repetitions: u32,
    pub total_size: u64,
    pub test_file: PathBuf,
    pub results: PathBuf,
}

impl SweepConfig {
    pub fn for_variant(variant: Variant) -> Self {
        SweepConfig {
            variant,
            chunk_sizes: variant.chunk_sizes(),
            repetitions: DEFAULT_REPETITIONS,
            total_size: variant.total_size(),
            test_file: PathBuf::from(DEFAULT_TEST_FILE),
            results: PathBuf::from(DEFAULT_RESULTS_FILE),
        }
    }

    /// Chunks larger than `total_size` are fine, each read request is clamped to what is left.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_sizes.is_empty() {
            return Err(BenchError::Config("no chunk sizes to benchmark".to_owned()));
        }
        if self.chunk_sizes.contains(&0) {
            return Err(BenchError::Config("chunk size must be positive".to_owned()));
        }
        if self.repetitions == 0 {
            return Err(BenchError::Config("repetitions must be positive".to_owned()));
        }
        if self.total_size == 0 {
            return Err(BenchError::Config("total size must be positive".to_owned()));
        }
        Ok(())
    }
}
