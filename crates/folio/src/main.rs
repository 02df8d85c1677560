//! Folio CLI - Guide page renderer.
//!
//! Provides commands for:
//! - `build`: Render guide pages to HTML
//! - `check`: Validate guide pages without writing output

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CheckArgs};
use output::Output;

/// Folio - Guide page renderer.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render guide pages to HTML.
    Build(BuildArgs),
    /// Parse and render guide pages without writing output.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Build(args) => args.sources.verbose,
        Commands::Check(args) => args.sources.verbose,
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.fatal(&err);
        std::process::exit(1);
    }
}

/// `--verbose` forces INFO; otherwise `RUST_LOG`, falling back to WARN.
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}
