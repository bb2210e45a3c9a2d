//! Tankland CLI - run and watch tank arena matches.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Tankland - programmed tanks fighting on a shared grid
#[derive(Parser, Debug)]
#[command(name = "tankland")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log every action (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a match headless and print the result
    Run {
        #[command(flatten)]
        arena: cli::ArenaArgs,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Draw the board in the terminal while the match runs
        #[arg(long)]
        live: bool,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Interactive TUI to watch a match in real time
    Watch {
        #[command(flatten)]
        arena: cli::ArenaArgs,
    },

    /// List the built-in behavior kinds
    Behaviors,

    /// Check a config file and its roster
    Validate {
        /// Arena config file (TOML)
        #[arg(required = true)]
        config: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // The TUI owns the terminal; its feed shows the log instead.
    if !matches!(args.command, Commands::Watch { .. }) {
        tankland::logging::init(args.verbose);
    }

    let result = match args.command {
        Commands::Run {
            arena,
            format,
            live,
            timeout,
        } => cli::run::execute(&arena, format, live, timeout).await,

        Commands::Watch { arena } => cli::watch::execute(&arena).await,

        Commands::Behaviors => {
            cli::behaviors::execute();
            Ok(())
        }

        Commands::Validate { config } => cli::validate::execute(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
