//! One validation run, end to end.
//!
//! Reading the save, decoding it and writing the snapshot are the only
//! suspension points. Merging and validation run synchronously over the
//! in-memory table set, which is never mutated once merged.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::critical::validate_critical_tables;
use crate::decoder::SaveDecoder;
use crate::error::{CareerSaveError, Result};
use crate::identity::check_identity;
use crate::merge::merge_fragments;
use crate::models::{DecodedOutput, TableSet};
use crate::report::{RecordPreview, ReportInputs, ValidationReport, persist_snapshot};
use crate::stats::collect_statistics;

/// Result of a run that got as far as a merged table set.
#[derive(Debug)]
pub struct RunOutcome {
    /// Save file that was decoded
    pub save_path: PathBuf,
    /// Size of the save file in bytes
    pub save_size: u64,
    /// Validation results over the merged table set
    pub report: ValidationReport,
    /// Snapshot location, or `PersistFailed` if it could not be written
    pub snapshot: Result<PathBuf>,
}

impl RunOutcome {
    /// Returns true if the snapshot was written.
    pub fn is_persisted(&self) -> bool {
        self.snapshot.is_ok()
    }
}

/// Runs the validators over a merged table set and assembles the report.
///
/// Pure read; the validators may run in any order.
pub fn validate_tables(
    tables: &TableSet,
    config: &PipelineConfig,
    fragment_count: usize,
    decode_time: Duration,
) -> ValidationReport {
    let statistics = collect_statistics(tables);
    let critical = validate_critical_tables(tables, config.critical_tables.as_slice());

    // A missing roster is reported through the critical list, not as a failure here.
    let identity = match check_identity(tables, &config.identity_table, &config.identity_field) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Identity check skipped: {}", e);
            None
        }
    };

    ValidationReport::assemble(ReportInputs {
        statistics,
        critical,
        identity,
        preview: RecordPreview::first_of(tables, &config.preview_table),
        fragment_count,
        decode_time,
    })
}

/// Reads the raw save bytes.
///
/// # Errors
/// `InputNotFound` when the path does not exist, `Io` for other read failures.
pub async fn read_save(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CareerSaveError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CareerSaveError::Io {
                context: format!("Failed to read save file {}", path.display()),
                source: e,
            }
        }
    })
}

/// Decodes raw bytes, bounded by the configured timeout.
pub async fn decode_save(
    decoder: &dyn SaveDecoder,
    raw: &[u8],
    config: &PipelineConfig,
) -> Result<DecodedOutput> {
    let value = tokio::time::timeout(
        config.decode_timeout,
        decoder.decode(raw, config.format_version),
    )
    .await
    .map_err(|_| CareerSaveError::DecodeTimeout {
        timeout: config.decode_timeout,
    })??;

    DecodedOutput::from_json(value)
}

/// Executes one run: read, decode, merge, validate, persist.
///
/// # Errors
/// Fatal errors (missing input, decode failure, timeout, malformed output,
/// invalid configuration) abort the run. A snapshot write failure does not:
/// it is returned in [`RunOutcome::snapshot`] alongside the report.
pub async fn run(config: &PipelineConfig, decoder: &dyn SaveDecoder) -> Result<RunOutcome> {
    config
        .validate()
        .map_err(|e| CareerSaveError::configuration(e.to_string()))?;

    let save_path = config.resolve_save_path();
    info!("Locating save file: {}", save_path.display());
    let raw = read_save(&save_path).await?;
    let save_size = raw.len() as u64;
    info!(
        "Found save file ({:.2} MB)",
        save_size as f64 / 1024.0 / 1024.0
    );

    info!("Decoding save with {} (this may take 10-30 seconds)...", decoder.name());
    let started = Instant::now();
    let decoded = decode_save(decoder, &raw, config).await.map_err(|e| {
        error!("Decoding failed: {}", e);
        e
    })?;
    let decode_time = started.elapsed();
    drop(raw);
    info!("Decoding completed in {:.2}s", decode_time.as_secs_f64());

    let fragment_count = decoded.fragment_count();
    if matches!(decoded, DecodedOutput::Many(_)) {
        info!("Found {} databases in save file", fragment_count);
    }

    let merged = merge_fragments(decoded);
    debug!("Merged table set holds {} tables", merged.len());

    let report = validate_tables(&merged, config, fragment_count, decode_time);
    info!(
        "Validated {} tables, {} records: {}",
        report.table_count, report.total_records, report.status
    );

    let snapshot = persist_snapshot(&merged, config.output_path()).await;
    match &snapshot {
        Ok(path) => info!("Saved snapshot to {}", path.display()),
        Err(e) => error!("{}", e),
    }

    Ok(RunOutcome {
        save_path,
        save_size,
        report,
        snapshot,
    })
}
