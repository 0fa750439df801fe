//! Console output for run results.
//!
//! Progress goes through `tracing`; the summaries below are the command's
//! actual output and are printed to stdout.

use careersave_core::error::CareerSaveError;
use careersave_core::{DUPLICATE_SAMPLE_LIMIT, Result, RunOutcome, TableCount, ValidationReport};

/// Tables listed after `parse`.
pub const PARSE_TOP_TABLES: usize = 5;
/// Tables listed after `validate`.
pub const VALIDATE_TOP_TABLES: usize = 10;

const BANNER_WIDTH: usize = 60;

fn banner(title: &str) {
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("{title}");
    println!("{}", "=".repeat(BANNER_WIDTH));
}

/// Formats a count with comma thousands separators.
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn print_top_tables(report: &ValidationReport, limit: usize) {
    println!("Top {limit} tables by record count:");
    for (i, rank) in report.top_tables(limit).iter().enumerate() {
        println!(
            "  {}. {}: {} records",
            i + 1,
            rank.table_name,
            format_count(rank.record_count)
        );
    }
}

fn print_snapshot_location(outcome: &RunOutcome) {
    match &outcome.snapshot {
        Ok(path) => println!("Saved to: {}", path.display()),
        Err(e) => println!("Snapshot not written: {e}"),
    }
}

/// Prints the `parse` summary: counts, largest tables and snapshot location.
pub fn print_parse_summary(outcome: &RunOutcome) {
    let report = &outcome.report;

    println!();
    banner("Parse completed");
    println!("Tables: {}", format_count(report.table_count));
    println!("Records: {}", format_count(report.total_records));
    if report.fragment_count > 1 {
        println!("Databases: {}", report.fragment_count);
    }
    println!("Decode time: {:.2}s", report.decode_seconds);
    println!();
    print_top_tables(report, PARSE_TOP_TABLES);
    println!();
    print_snapshot_location(outcome);
}

/// Prints the full `validate` summary ending in the verdict.
pub fn print_validation_summary(outcome: &RunOutcome) {
    let report = &outcome.report;

    println!();
    banner("Validation results");
    println!(
        "Save file: {} ({:.2} MB)",
        outcome.save_path.display(),
        outcome.save_size as f64 / 1024.0 / 1024.0
    );
    println!("Databases: {}", report.fragment_count);
    println!("Tables: {}", format_count(report.table_count));
    println!("Records: {}", format_count(report.total_records));
    println!("Decode time: {:.2}s", report.decode_seconds);

    println!();
    println!("Critical tables:");
    for (table, count) in &report.present_critical_tables {
        match count {
            TableCount::Records(n) => println!("  ✓ {table}: {} records", format_count(*n)),
            TableCount::NotCountable => println!("  ✓ {table}: {count}"),
        }
    }
    for table in &report.missing_critical_tables {
        println!("  ✗ {table}: MISSING");
    }

    if let Some(preview) = &report.preview {
        println!();
        println!("Sample record from {}:", preview.table);
        for (field, value) in &preview.fields {
            println!("  {field}: {value}");
        }
    }

    println!();
    print_top_tables(report, VALIDATE_TOP_TABLES);

    println!();
    match &report.identity {
        Some(identity) => {
            println!(
                "Identity check ({}.{}): {} valid, {} unique, {} placeholders",
                identity.table,
                identity.field,
                format_count(identity.valid_count),
                format_count(identity.unique_count),
                format_count(identity.placeholder_count())
            );
            if identity.has_duplicates() {
                println!("  ⚠ {} duplicated identifiers:", identity.duplicates.len());
                for dup in identity.sample_duplicates(DUPLICATE_SAMPLE_LIMIT) {
                    println!("    {} appears {} times", dup.id, dup.count);
                }
            } else {
                println!("  ✓ All valid identifiers are unique");
            }
        }
        None => println!("Identity check skipped: roster table not present"),
    }

    println!();
    print_snapshot_location(outcome);
    println!();
    banner(&verdict_title(outcome));
    if !outcome.is_persisted() {
        println!("The checks finished but the snapshot could not be written; exiting with an error");
    }
    if !report.is_complete() {
        println!(
            "{} critical table(s) missing; the save may be incomplete or from another format version",
            report.missing_critical_tables.len()
        );
    }
}

/// Verdict banner text; flags runs whose snapshot was not written.
pub fn verdict_title(outcome: &RunOutcome) -> String {
    if outcome.is_persisted() {
        format!("VALIDATION {}", outcome.report.status)
    } else {
        format!("VALIDATION {} (SNAPSHOT NOT SAVED)", outcome.report.status)
    }
}

/// Failure banner text.
///
/// A persist failure comes after a printed verdict, so it gets its own title.
pub fn failure_title(error: &CareerSaveError) -> &'static str {
    match error {
        CareerSaveError::PersistFailed { .. } => "SNAPSHOT WRITE FAILED",
        _ => "VALIDATION FAILED",
    }
}

/// Prints the report as pretty JSON.
///
/// # Errors
/// Returns `Serialization` if the report cannot be encoded.
pub fn print_report_json(report: &ValidationReport) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).map_err(|e| CareerSaveError::Serialization {
            context: "Failed to encode validation report".to_string(),
            source: e,
        })?;
    println!("{json}");
    Ok(())
}

/// Troubleshooting hints for an error, if any apply.
pub fn hints_for(error: &CareerSaveError) -> &'static [&'static str] {
    match error {
        CareerSaveError::InputNotFound { .. } => &[
            "Set SAVES_PATH to the directory holding your career saves",
            "Or pass the save file path as the first argument",
        ],
        CareerSaveError::DecodeTimeout { .. } => &[
            "Large saves can take a while; raise --timeout",
            "Check that the decoder is not waiting for interactive input",
        ],
        e if e.is_decode_stage() => &[
            "The game update may have changed the save format (try --format-version)",
            "The save file may be corrupted; reload it in game and save again",
            "The decoder may not support this save; update it",
        ],
        _ => &[],
    }
}

/// Prints the failure banner, error chain and hints.
pub fn print_failure(error: &CareerSaveError) {
    eprintln!();
    eprintln!("{}", "=".repeat(BANNER_WIDTH));
    eprintln!("{}", failure_title(error));
    eprintln!("{}", "=".repeat(BANNER_WIDTH));
    eprintln!("Error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {cause}");
        source = cause.source();
    }

    let hints = hints_for(error);
    if !hints.is_empty() {
        eprintln!();
        eprintln!("Possible fixes:");
        for hint in hints {
            eprintln!("  - {hint}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_count(100_000), "100,000");
    }

    #[test]
    fn test_hints_by_error_kind() {
        let timeout = CareerSaveError::DecodeTimeout {
            timeout: Duration::from_secs(60),
        };
        assert!(hints_for(&timeout)[0].contains("--timeout"));

        let malformed = CareerSaveError::malformed("decoder output is a string");
        assert_eq!(hints_for(&malformed).len(), 3);

        let missing = CareerSaveError::InputNotFound {
            path: "save".into(),
        };
        assert!(hints_for(&missing)[0].contains("SAVES_PATH"));

        assert!(hints_for(&CareerSaveError::table_not_found("players")).is_empty());
    }

    #[test]
    fn test_failure_title_for_persist_error() {
        let persist = CareerSaveError::persist_failed(
            "out/test_parse.json",
            std::io::Error::other("read-only file system"),
        );
        assert_eq!(failure_title(&persist), "SNAPSHOT WRITE FAILED");
        assert_eq!(
            failure_title(&CareerSaveError::malformed("decoder output is null")),
            "VALIDATION FAILED"
        );
    }
}
