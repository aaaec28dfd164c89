//! CLI command definitions.
//!
//! Each subcommand maps to one workflow of the reviewer.

use clap::{Parser, Subcommand, ValueEnum};

pub mod classify;
pub mod review;

/// apirev - API description review against versioned commonalities
#[derive(Parser)]
#[command(name = "apirev")]
#[command(version, about = "apirev - API description review against versioned commonalities")]
#[command(long_about = r#"
apirev reviews the OpenAPI descriptions of a repository against a versioned
set of organisational conventions ("commonalities") and reports findings
by severity.

WORKFLOWS:
  review    → Review code/API_definitions and code/Test_definitions of a repo
  classify  → Print the detected API type of description files

EXIT CODES:
  0 - Success (findings alone never fail a run)
  1 - General error
  2 - Invalid arguments
  3 - Critical findings (only with --fail-on-critical)
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Review every API description of a repository
    Review(review::ReviewArgs),

    /// Detect the API type of description files
    Classify(classify::ClassifyArgs),
}

/// Output format shared by all commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
