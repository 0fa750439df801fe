//! careersave - career-mode save validation
//!
//! Decodes a save with an external decoder, merges the decoded databases,
//! reports table statistics and integrity checks, and writes the merged
//! table set as a JSON snapshot.
//!
//! # Guarantees
//! - The save file is read once and never modified
//! - Exit code 0 for complete and partial success, 1 for any failure
//! - A snapshot write failure is reported after the summary

use std::process::ExitCode;

use careersave::Cli;
use careersave::commands::{EXIT_FAILURE, dispatch, exit_status};
use careersave_core::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is not an error
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let result = dispatch(&cli).await;
    ExitCode::from(exit_status(&result))
}
