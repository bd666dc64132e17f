use std::{path::Path, time::Duration};

use itertools::Itertools;
use serde_with::serde_as;

use crate::{
    config::SweepConfig,
    error::{BenchError, Result},
    results::BenchmarkResult,
};

const LATENCY_PERCENTILES: [f64; 2] = [90.0, 99.0];

/// Accumulates the runs of one chunk size.
///
/// Mean, median and stddev are exact over the per-run values; the histogram only
/// provides the extremes and tail percentiles.
pub struct ChunkStats {
    chunk_size: usize,
    latencies_histo: hdrhistogram::Histogram<u64>,
    read_times: Vec<f64>,
    throughputs: Vec<f64>,
}

impl ChunkStats {
    fn make_latency_histogram() -> hdrhistogram::Histogram<u64> {
        // 1ns .. ~16min, anything slower saturates
        hdrhistogram::Histogram::new_with_bounds(1, 1_000_000_000_000, 3)
            .expect("latency histogram bounds are valid")
    }

    pub fn new(chunk_size: usize) -> Self {
        ChunkStats {
            chunk_size,
            latencies_histo: Self::make_latency_histogram(),
            read_times: Vec::new(),
            throughputs: Vec::new(),
        }
    }

    pub fn record(&mut self, result: &BenchmarkResult) {
        debug_assert_eq!(result.chunk_size, self.chunk_size);
        let nanos = (result.read_time_ms * 1_000_000.0).round() as u64;
        self.latencies_histo.saturating_record(nanos.max(1));
        self.read_times.push(result.read_time_ms);
        self.throughputs.push(result.throughput_mbps);
    }

    pub fn summarize(&self) -> ChunkSummary {
        let histo = &self.latencies_histo;
        let ns_to_ms = |ns: f64| ns / 1_000_000.0;
        let mut percentiles = [0.0; LATENCY_PERCENTILES.len()];
        for (value, p) in percentiles.iter_mut().zip(LATENCY_PERCENTILES) {
            *value = ns_to_ms(histo.value_at_percentile(p) as f64);
        }
        let [p90, p99] = percentiles;
        ChunkSummary {
            chunk_size: self.chunk_size,
            runs: self.throughputs.len(),
            read_time_ms: LatencySummary {
                min: ns_to_ms(histo.min() as f64),
                mean: mean(&self.read_times),
                median: median(&self.read_times),
                p90,
                p99,
                max: ns_to_ms(histo.max() as f64),
                stddev: sample_stddev(&self.read_times),
            },
            throughput_mbps: ThroughputSummary {
                mean: mean(&self.throughputs),
                median: median(&self.throughputs),
                stddev: sample_stddev(&self.throughputs),
            },
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let sorted = values.iter().copied().sorted_by(f64::total_cmp).collect_vec();
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// n-1 denominator; zero when there are fewer than two values.
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct LatencySummary {
    pub min: f64,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    pub p99: f64,
    pub max: f64,
    pub stddev: f64,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ThroughputSummary {
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ChunkSummary {
    pub chunk_size: usize,
    pub runs: usize,
    pub read_time_ms: LatencySummary,
    pub throughput_mbps: ThroughputSummary,
}

impl std::fmt::Display for ChunkSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat = &self.read_time_ms;
        let tp = &self.throughput_mbps;
        write!(
            f,
            "chunk={} runs={} LAT(ms): min={:.3} mean={:.3} median={:.3} {} max={:.3} std={:.3} TP(MB/s): mean={:.2} median={:.2} std={:.2}",
            self.chunk_size,
            self.runs,
            lat.min,
            lat.mean,
            lat.median,
            [lat.p90, lat.p99]
                .iter()
                .zip(LATENCY_PERCENTILES.iter())
                .map(|(v, p)| format!("p{p}={v:.3}"))
                .join(" "),
            lat.max,
            lat.stddev,
            tp.mean,
            tp.median,
            tp.stddev,
        )
    }
}

/// Outcome of a complete sweep, written by `--summary-json`.
#[serde_as]
#[derive(Clone, Debug, serde::Serialize)]
pub struct SweepReport {
    pub config: SweepConfig,
    #[serde_as(as = "serde_with::DurationMicroSeconds")]
    pub elapsed_us: Duration,
    pub rows_written: u64,
    pub chunks: Vec<ChunkSummary>,
}

impl SweepReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(BenchError::io("write", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIB;

    fn result(run_number: u32, millis: u64) -> BenchmarkResult {
        BenchmarkResult::from_elapsed(4096, run_number, MIB, Duration::from_millis(millis))
    }

    #[test]
    fn summary_of_three_runs() {
        let mut stats = ChunkStats::new(4096);
        stats.record(&result(1, 10));
        stats.record(&result(2, 20));
        stats.record(&result(3, 40));
        let s = stats.summarize();

        assert_eq!(s.chunk_size, 4096);
        assert_eq!(s.runs, 3);
        let lat = &s.read_time_ms;
        assert!(lat.min <= lat.median && lat.median <= lat.max);
        assert!((lat.min - 10.0).abs() < 0.1, "{lat:?}");
        assert!((lat.max - 40.0).abs() < 0.1, "{lat:?}");
        // 1 MiB in 10/20/40ms
        assert!((s.throughput_mbps.median - 50.0).abs() < 1e-9);
        assert!((s.throughput_mbps.mean - (100.0 + 50.0 + 25.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn read_time_median_and_stddev_are_exact_for_even_run_count() {
        let mut stats = ChunkStats::new(4096);
        for (run_number, millis) in [10, 20, 40, 50].into_iter().enumerate() {
            stats.record(&result(run_number as u32 + 1, millis));
        }
        let lat = stats.summarize().read_time_ms;

        assert!((lat.median - 30.0).abs() < 1e-9, "{lat:?}");
        assert!((lat.mean - 30.0).abs() < 1e-9, "{lat:?}");
        // n-1 denominator: sqrt(1000 / 3)
        assert!((lat.stddev - 18.257).abs() < 1e-3, "{lat:?}");
        assert!(lat.p90 >= lat.median && lat.p99 <= lat.max, "{lat:?}");
    }

    #[test]
    fn median_and_stddev() {
        assert_eq!(median(&[3.0, 1.0, 2.0, 4.0]), 2.5);
        assert_eq!(median(&[5.0]), 5.0);
        assert_eq!(sample_stddev(&[5.0]), 0.0);
        assert!((sample_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.138).abs() < 1e-3);
    }

    #[test]
    fn display_mentions_percentiles() {
        let mut stats = ChunkStats::new(4096);
        stats.record(&result(1, 10));
        let line = stats.summarize().to_string();
        assert!(line.starts_with("chunk=4096 runs=1 "), "{line}");
        assert!(line.contains("median="), "{line}");
        assert!(line.contains("p90="), "{line}");
        assert!(line.contains("p99="), "{line}");
    }

    #[test]
    fn report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let mut stats = ChunkStats::new(4096);
        stats.record(&result(1, 10));
        let report = SweepReport {
            config: SweepConfig::for_variant(crate::config::Variant::SingleLarge),
            elapsed_us: Duration::from_millis(12),
            rows_written: 1,
            chunks: vec![stats.summarize()],
        };
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["elapsed_us"], 12_000);
        assert_eq!(value["rows_written"], 1);
        assert_eq!(value["chunks"][0]["chunk_size"], 4096);
        assert_eq!(value["config"]["repetitions"], 30);
        assert_eq!(value["config"]["variant"], "single-large");
    }
}
