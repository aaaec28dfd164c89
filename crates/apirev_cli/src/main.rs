//! apirev CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success (findings alone never fail a run)
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Critical findings with `--fail-on-critical`

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod discover;
mod error;
mod report;

use commands::{Cli, Commands};
use error::CliError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CRITICAL_FINDINGS: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        "apirev=debug"
    } else if cli.quiet {
        "apirev=warn"
    } else {
        "apirev=info"
    };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = level.parse() {
        filter = filter.add_directive(directive);
    }
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Review(args) => commands::review::execute(args, cli.quiet).await,
        Commands::Classify(args) => commands::classify::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<CliError>() {
        Some(CliError::InvalidArgument(_)) => ExitCodes::INVALID_ARGS,
        Some(CliError::CriticalFindings(_)) => ExitCodes::CRITICAL_FINDINGS,
        None => ExitCodes::GENERAL_ERROR,
    }
}
