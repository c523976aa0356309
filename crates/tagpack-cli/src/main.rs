mod config;
mod drivers;
mod scan;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tagpack::cli::Verbosity;

#[derive(Parser, Debug)]
#[command(name = "tagpack")]
#[command(about = "List the Composer packages provided by the tags and branches of a repository")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v shows skipped versions, -vv debug output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors and warnings
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a repository and print its package versions
    Scan(scan::ScanArgs),

    /// List the available drivers in selection order
    Drivers,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run() -> Result<i32> {
    let args = Args::parse();

    init_logging(args.verbose);

    let verbosity = if args.quiet {
        Verbosity::Quiet
    } else {
        Verbosity::from_occurrences(args.verbose)
    };

    match args.command {
        Commands::Scan(scan_args) => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;
            rt.block_on(scan::execute(scan_args, verbosity))
        }
        Commands::Drivers => drivers::execute(),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
