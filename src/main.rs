//! CLI entry point for the pixel art pattern optimizer

use clap::Parser;
use pixelruns::io::cli::{Cli, FileProcessor};
use tracing_subscriber::EnvFilter;

fn main() -> pixelruns::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut processor = FileProcessor::new(cli);
    processor.process()
}
