//! Core pipeline for validating decoded career-mode saves.
//!
//! An external decoder turns a binary save into JSON: one table set, or an
//! array of table sets when the save holds several sub-databases. This crate
//! merges that output, computes table statistics, checks the critical tables
//! and the player identity field, and persists the merged set as a snapshot.
//!
//! # Guarantees
//! - Save files are only read, never modified
//! - Merging replaces whole tables (last fragment wins); rows are never combined
//! - The merged table set is immutable once validation starts
//!
//! # Architecture
//! - `SaveDecoder` trait isolates the external decoder
//! - Validators are pure functions over a borrowed `TableSet`
//! - `PipelineConfig` carries every option explicitly; no global state

pub mod config;
pub mod critical;
pub mod decoder;
pub mod error;
pub mod identity;
pub mod logging;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod stats;

// Re-export commonly used types
pub use config::{ConfigValidationError, PipelineConfig};
pub use critical::{CriticalTableReport, DEFAULT_CRITICAL_TABLES, TableCount, validate_critical_tables};
pub use decoder::{CommandDecoder, JsonDumpDecoder, SaveDecoder, create_decoder};
pub use error::{CareerSaveError, Result};
pub use identity::{DUPLICATE_SAMPLE_LIMIT, DuplicateIdentity, IdentityReport, check_identity};
pub use logging::init_logging;
pub use merge::merge_fragments;
pub use models::{DecodedOutput, FieldValue, Fragment, Record, Scalar, TableSet, TableValue};
pub use pipeline::{RunOutcome, run};
pub use report::{RecordPreview, RunStatus, ValidationReport, load_snapshot, persist_snapshot};
pub use stats::{TableRank, TableStatistics, collect_statistics};
