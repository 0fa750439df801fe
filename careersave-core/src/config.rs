//! Pipeline configuration.
//!
//! All options a run depends on live in [`PipelineConfig`], which callers
//! build explicitly and pass to [`crate::pipeline::run`]. Environment lookups
//! happen only at the CLI layer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::critical::DEFAULT_CRITICAL_TABLES;
use crate::decoder::DEFAULT_FORMAT_VERSION;

/// Environment variable naming the base saves directory.
pub const SAVES_PATH_ENV: &str = "SAVES_PATH";

/// Save folder name joined onto the saves directory.
pub const DEFAULT_SAVE_NAME: &str = "CmMgrC20251119080713440";

/// Save path used when neither an explicit path nor a saves directory is given.
pub const FALLBACK_SAVE_PATH: &str =
    r"C:\Users\Public\AppData\Local\EA SPORTS FC 26\settings\CmMgrC20251119080713440";

/// Snapshot location, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "parser/output/test_parse.json";

/// Table holding the player roster.
pub const DEFAULT_IDENTITY_TABLE: &str = "players";

/// Identity field of the player roster.
pub const DEFAULT_IDENTITY_FIELD: &str = "playerid";

/// Table whose first record is shown as a preview.
pub const DEFAULT_PREVIEW_TABLE: &str = "career_playergrowthuserseason";

/// Decoding a full career save takes 10-30 seconds; allow headroom.
const DEFAULT_DECODE_TIMEOUT_SECS: u64 = 60;

/// Validation errors for pipeline configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// The decode timeout is zero
    #[error("decode timeout must be greater than zero")]
    ZeroTimeout,
    /// The identity table or field is empty
    #[error("identity table and field must not be empty")]
    EmptyIdentity,
    /// A critical table name appears twice
    #[error("critical table '{0}' is listed more than once")]
    DuplicateCriticalTable(String),
    /// The snapshot path is empty
    #[error("output path must not be empty")]
    EmptyOutputPath,
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base directory for default input resolution (`SAVES_PATH`)
    pub saves_path: Option<PathBuf>,
    /// Explicit save file; overrides default resolution
    pub save_path: Option<PathBuf>,
    /// Where the merged table set snapshot is written
    pub output_path: PathBuf,
    /// Format version tag handed to the decoder
    pub format_version: u32,
    /// Upper bound on the decode call
    pub decode_timeout: Duration,
    /// Tables whose absence downgrades the run to partial success
    pub critical_tables: Vec<String>,
    /// Table scanned by the identity check
    pub identity_table: String,
    /// Field scanned by the identity check
    pub identity_field: String,
    /// Table whose first record is previewed
    pub preview_table: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            saves_path: None,
            save_path: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            format_version: DEFAULT_FORMAT_VERSION,
            decode_timeout: Duration::from_secs(DEFAULT_DECODE_TIMEOUT_SECS),
            critical_tables: DEFAULT_CRITICAL_TABLES
                .iter()
                .map(ToString::to_string)
                .collect(),
            identity_table: DEFAULT_IDENTITY_TABLE.to_string(),
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            preview_table: DEFAULT_PREVIEW_TABLE.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the saves base directory.
    pub fn with_saves_path(mut self, saves_path: Option<PathBuf>) -> Self {
        self.saves_path = saves_path;
        self
    }

    /// Builder method to set an explicit save file.
    pub fn with_save_path(mut self, save_path: Option<PathBuf>) -> Self {
        self.save_path = save_path;
        self
    }

    /// Builder method to set the snapshot path.
    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    /// Builder method to set the decoder format version.
    pub fn with_format_version(mut self, format_version: u32) -> Self {
        self.format_version = format_version;
        self
    }

    /// Builder method to set the decode timeout.
    pub fn with_decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout = timeout;
        self
    }

    /// Builder method to replace the critical table list.
    pub fn with_critical_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the identity table and field.
    pub fn with_identity(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.identity_table = table.into();
        self.identity_field = field.into();
        self
    }

    /// Builder method to set the preview table.
    pub fn with_preview_table(mut self, table: impl Into<String>) -> Self {
        self.preview_table = table.into();
        self
    }

    /// Resolves the save file to read.
    ///
    /// Precedence: explicit `save_path`, then `saves_path` joined with the
    /// save folder name, then the hard-coded fallback.
    pub fn resolve_save_path(&self) -> PathBuf {
        if let Some(path) = &self.save_path {
            return path.clone();
        }
        match &self.saves_path {
            Some(base) => base.join(DEFAULT_SAVE_NAME),
            None => PathBuf::from(FALLBACK_SAVE_PATH),
        }
    }

    /// Snapshot location.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.decode_timeout.is_zero() {
            return Err(ConfigValidationError::ZeroTimeout);
        }
        if self.identity_table.is_empty() || self.identity_field.is_empty() {
            return Err(ConfigValidationError::EmptyIdentity);
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyOutputPath);
        }
        for (index, table) in self.critical_tables.iter().enumerate() {
            if self.critical_tables[..index].contains(table) {
                return Err(ConfigValidationError::DuplicateCriticalTable(
                    table.clone(),
                ));
            }
        }
        Ok(())
    }
}
