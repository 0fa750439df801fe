//! Command workflows and exit status mapping.
//!
//! `main` only parses arguments, sets up logging and turns the result of
//! [`dispatch`] into a process exit code.

use careersave_core::{Result, RunOutcome, create_decoder, run};
use tracing::{error, info};

use crate::check::check_ids;
use crate::summary::{
    print_failure, print_parse_summary, print_report_json, print_validation_summary,
};
use crate::{Cli, Command, RunArgs};

/// Exit code for complete and partial success.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for any failure, including a snapshot that could not be written.
pub const EXIT_FAILURE: u8 = 1;

/// What to print after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Counts, largest tables and snapshot location
    Parse,
    /// Every check, ending in the verdict
    Validate,
}

/// Decodes, validates and persists one save.
///
/// # Errors
/// Any fatal pipeline error. A snapshot write failure is not fatal here; it
/// stays in [`RunOutcome::snapshot`].
pub async fn execute(args: &RunArgs) -> Result<RunOutcome> {
    let config = args.to_config();
    let decoder = create_decoder(args.decoder.as_deref())?;
    info!("Using {} decoder", decoder.name());

    run(&config, decoder.as_ref()).await
}

/// Prints the outcome, then fails if the snapshot was not written.
///
/// # Errors
/// `PersistFailed` when the snapshot could not be written, or
/// `Serialization` if the JSON report cannot be encoded.
pub fn finish(outcome: RunOutcome, mode: Mode, json: bool) -> Result<()> {
    if json {
        print_report_json(&outcome.report)?;
    } else {
        match mode {
            Mode::Parse => print_parse_summary(&outcome),
            Mode::Validate => print_validation_summary(&outcome),
        }
    }

    outcome.snapshot.map(|_| ())
}

/// Runs `parse` or `validate`.
///
/// # Errors
/// See [`execute`] and [`finish`].
pub async fn run_save(args: &RunArgs, mode: Mode) -> Result<()> {
    let outcome = execute(args).await?;
    finish(outcome, mode, args.json)
}

/// Runs the command selected on the command line.
///
/// # Errors
/// Whatever the selected command returns.
pub async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Command::Parse(args)) => run_save(args, Mode::Parse).await,
        Some(Command::Validate(args)) => run_save(args, Mode::Validate).await,
        Some(Command::CheckIds(args)) => check_ids(args).await,
        // Default behavior: validate the save named on the command line
        None => run_save(&cli.run, Mode::Validate).await,
    }
}

/// Reports a command result and returns the process exit code.
pub fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("{}", e);
            print_failure(e);
            EXIT_FAILURE
        }
    }
}
