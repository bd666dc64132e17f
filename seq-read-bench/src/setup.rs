//! Creation of the test file the benchmark reads.

use std::{io::Write, path::Path};

use rand::RngCore;
use tracing::info;

use crate::{
    error::{BenchError, Result},
    util::close_checked,
};

const WRITE_BLOCK: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Fill {
    /// `(i * 73 + 17) & 0xff` for each offset `i` within a 64 KiB block.
    Pattern,
    Zeros,
    Random,
}

fn fill_block(fill: Fill, block: &mut [u8]) {
    match fill {
        Fill::Pattern => {
            for (i, b) in block.iter_mut().enumerate() {
                *b = (i.wrapping_mul(73).wrapping_add(17) & 0xff) as u8;
            }
        }
        Fill::Zeros => block.fill(0),
        Fill::Random => rand::thread_rng().fill_bytes(block),
    }
}

/// Write a fresh `total_size` byte file at `path`, replacing whatever was there.
pub fn create_test_file(path: &Path, total_size: u64, fill: Fill) -> Result<()> {
    info!("Creating {total_size} byte test file {:?} ({fill:?} fill)", path);
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(BenchError::io("create", path))?;

    let mut block = vec![0u8; WRITE_BLOCK];
    if fill != Fill::Random {
        fill_block(fill, &mut block);
    }
    let mut remaining = total_size;
    while remaining > 0 {
        let len = remaining.min(WRITE_BLOCK as u64) as usize;
        if fill == Fill::Random {
            fill_block(fill, &mut block[..len]);
        }
        file.write_all(&block[..len])
            .map_err(BenchError::io("write", path))?;
        remaining -= len as u64;
    }
    file.sync_all().map_err(BenchError::io("sync", path))?;
    close_checked(file, path)?;

    let len = std::fs::metadata(path)
        .map_err(BenchError::io("stat", path))?
        .len();
    info!("Test file created successfully ({len} bytes)");
    Ok(())
}
