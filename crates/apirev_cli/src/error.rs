//! Errors that select a non-default exit code.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} critical issue(s) found")]
    CriticalFindings(usize),
}
