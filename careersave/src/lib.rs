//! Library module for the careersave binary.
//!
//! Exposes the CLI definition and command implementations so they can be
//! exercised from integration tests. The entry point is in main.rs.

pub mod check;
pub mod commands;
pub mod summary;

use std::path::PathBuf;
use std::time::Duration;

use careersave_core::PipelineConfig;
use careersave_core::config::{
    DEFAULT_IDENTITY_FIELD, DEFAULT_IDENTITY_TABLE, DEFAULT_OUTPUT_PATH, DEFAULT_PREVIEW_TABLE,
    SAVES_PATH_ENV,
};
use careersave_core::decoder::DEFAULT_FORMAT_VERSION;
use clap::{Args, Parser, Subcommand};

/// Default decode timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "careersave")]
#[command(about = "Career save decoding and validation tool")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "
careersave - Career-mode save validation

Runs an external decoder over a career save, merges the decoded databases
into a single table set and reports:
- Table and record counts, largest tables first
- Presence of the critical career tables
- Duplicate or unassigned player identifiers

The merged table set is written to parser/output/test_parse.json unless
--output says otherwise.

ENVIRONMENT:
  SAVES_PATH           Directory holding career saves (default input resolution)
  CAREERSAVE_DECODER   External decoder command (stdin: save bytes, stdout: JSON)

EXAMPLES:
  careersave validate ~/saves/CmMgrC20251119080713440
  careersave parse --decoder 'node decode.js' --timeout 120
  careersave check-ids --distribution
")]
pub struct Cli {
    /// Verbosity flags, accepted before or after the subcommand
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute; `validate` when absent
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Arguments for the default `validate` behavior
    #[command(flatten)]
    pub run: RunArgs,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a save, print statistics and write the snapshot
    Parse(RunArgs),
    /// Decode a save and run every validation check
    Validate(RunArgs),
    /// Check player identifiers in an existing snapshot
    CheckIds(CheckArgs),
}

/// Options shared by `parse` and `validate`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Save file path
    #[arg(
        value_name = "SAVE_PATH",
        help = "Save file to decode (default: $SAVES_PATH/CmMgrC20251119080713440)"
    )]
    pub save_path: Option<PathBuf>,

    /// Base directory of career saves
    #[arg(long, env = SAVES_PATH_ENV, value_name = "DIR")]
    pub saves_path: Option<PathBuf>,

    /// Snapshot output path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH, value_name = "FILE")]
    pub output: PathBuf,

    /// External decoder command
    #[arg(
        long,
        env = "CAREERSAVE_DECODER",
        value_name = "COMMAND",
        help = "Decoder command; without it the input must already be decoder JSON"
    )]
    pub decoder: Option<String>,

    /// Decoder format version
    #[arg(long, default_value_t = DEFAULT_FORMAT_VERSION)]
    pub format_version: u32,

    /// Decode timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_name = "SECS")]
    pub timeout: u64,

    /// Critical tables override
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "TABLES",
        help = "Comma-separated critical tables (default: the career tables)"
    )]
    pub critical_tables: Vec<String>,

    /// Table scanned for duplicate identifiers
    #[arg(long, default_value = DEFAULT_IDENTITY_TABLE)]
    pub identity_table: String,

    /// Identity field of that table
    #[arg(long, default_value = DEFAULT_IDENTITY_FIELD)]
    pub identity_field: String,

    /// Print the report as JSON instead of the text summary
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Builds the pipeline configuration from the parsed arguments.
    pub fn to_config(&self) -> PipelineConfig {
        let config = PipelineConfig::new()
            .with_save_path(self.save_path.clone())
            .with_saves_path(self.saves_path.clone())
            .with_output_path(self.output.clone())
            .with_format_version(self.format_version)
            .with_decode_timeout(Duration::from_secs(self.timeout))
            .with_identity(self.identity_table.clone(), self.identity_field.clone())
            .with_preview_table(DEFAULT_PREVIEW_TABLE);

        if self.critical_tables.is_empty() {
            config
        } else {
            config.with_critical_tables(self.critical_tables.iter().cloned())
        }
    }
}

/// Options for `check-ids`.
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Snapshot to read
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Player roster table
    #[arg(long, default_value = DEFAULT_IDENTITY_TABLE)]
    pub table: String,

    /// Identity field of the roster
    #[arg(long, default_value = DEFAULT_IDENTITY_FIELD)]
    pub field: String,

    /// Also list the most common raw ids and candidate key fields
    #[arg(long)]
    pub distribution: bool,
}

/// Verbosity flags
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logs except errors")]
    pub quiet: bool,
}
