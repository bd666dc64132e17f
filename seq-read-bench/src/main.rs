use std::{io::IsTerminal, num::NonZeroU64, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::error;

use config::{
    SweepConfig, Variant, DEFAULT_REPETITIONS, DEFAULT_RESULTS_FILE, DEFAULT_TEST_FILE, MIB,
};
use error::Result;
use setup::Fill;

mod config;
mod error;
mod results;
mod runner;
mod setup;
mod summary;
mod util;

/// Sequential read throughput benchmark.
///
/// Without a subcommand, runs the benchmark with the default configuration.
#[derive(clap::Parser)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Read the test file with every chunk size and write the results CSV.
    Run(RunArgs),
    /// Create the test file.
    Prepare(PrepareArgs),
}

#[derive(clap::Args, Clone)]
struct FileArgs {
    #[clap(long, value_enum, default_value = "incremental")]
    variant: Variant,
    /// Overrides the variant's test file size.
    #[clap(long, conflicts_with = "total_size")]
    file_size_mib: Option<NonZeroU64>,
    /// Test file size in bytes.
    #[clap(long)]
    total_size: Option<NonZeroU64>,
    #[clap(long, default_value = DEFAULT_TEST_FILE)]
    test_file: PathBuf,
}

impl FileArgs {
    fn total_size(&self) -> u64 {
        match (self.total_size, self.file_size_mib) {
            (Some(bytes), _) => bytes.get(),
            (None, Some(mib)) => mib.get() * MIB,
            (None, None) => self.variant.total_size(),
        }
    }
}

#[derive(clap::Args, Clone)]
struct RunArgs {
    #[command(flatten)]
    file: FileArgs,
    #[clap(long, default_value_t = DEFAULT_REPETITIONS)]
    repetitions: u32,
    /// Replaces the variant's chunk sizes; may be repeated.
    #[clap(long = "chunk-size")]
    chunk_sizes: Vec<usize>,
    #[clap(long, default_value = DEFAULT_RESULTS_FILE)]
    results: PathBuf,
    /// Also write per chunk size statistics as JSON.
    #[clap(long)]
    summary_json: Option<PathBuf>,
}

impl RunArgs {
    fn sweep_config(&self) -> SweepConfig {
        let mut config = SweepConfig::for_variant(self.file.variant);
        if !self.chunk_sizes.is_empty() {
            config.chunk_sizes = self.chunk_sizes.clone();
        }
        config.repetitions = self.repetitions;
        config.total_size = self.file.total_size();
        config.test_file = self.file.test_file.clone();
        config.results = self.results.clone();
        config
    }
}

#[derive(clap::Args, Clone)]
struct PrepareArgs {
    #[command(flatten)]
    file: FileArgs,
    #[clap(long, value_enum, default_value = "pattern")]
    fill: Fill,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run(cli.run));

    match dispatch(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // the diagnostic must reach stderr even when RUST_LOG silences errors
            if tracing::enabled!(tracing::Level::ERROR) {
                error!("{e}");
            } else {
                eprintln!("error: {e}");
            }
            ExitCode::from(1)
        }
    }
}

fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => {
            runner::run_and_report(&args.sweep_config(), args.summary_json.as_deref())
        }
        Command::Prepare(args) => {
            setup::create_test_file(&args.file.test_file, args.file.total_size(), args.fill)
        }
    }
}
