//! Log output for pipeline runs.
//!
//! Logs go to stderr so that stdout carries only command results (the
//! location key, or the validation summary).

use tracing::Level;

use crate::error::{PipelineError, Result};

/// Tracing level for the `-v`/`-q` flags.
///
/// `quiet` wins over any verbosity; otherwise each `-v` steps from INFO
/// down through DEBUG to TRACE.
pub const fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the process-wide fmt subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| PipelineError::configuration(format!("Logging setup failed: {}", e)))
}
