//! bqci CLI
//!
//! Argument parsing and process plumbing for the `run-tests` and
//! `create-dev-env` binaries. The binaries themselves only parse, set up
//! tracing and map the outcome to an exit code.

pub mod args;
pub mod create_dev_env;
pub mod telemetry;

pub use create_dev_env::CreateDevEnvCli;
pub use run_tests::RunTestsCli;
pub use telemetry::init_tracing;

use bqci_core::BqciError;
use std::process::ExitCode;

/// Exit status for errors that stop a run (bad input, config, backend).
pub const EXIT_FATAL: u8 = 1;

/// Report a fatal error through tracing (stderr) and produce the matching exit code.
pub fn fatal(err: &BqciError) -> ExitCode {
    tracing::error!(error = %err, "Aborted");
    ExitCode::from(EXIT_FATAL)
}
