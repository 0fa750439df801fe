//! Standalone identity check over a written snapshot.
//!
//! Unlike the in-pipeline check, a missing roster table is fatal here:
//! there is nothing else to report.

use careersave_core::identity::{
    FieldUniqueness, ValueFrequency, candidate_key_fields, check_rows, value_distribution,
};
use careersave_core::report::read_snapshot;
use careersave_core::{CareerSaveError, DUPLICATE_SAMPLE_LIMIT, IdentityReport, Result};
use tracing::{info, warn};

use crate::CheckArgs;
use crate::summary::format_count;

/// Raw values listed by `--distribution`.
pub const DISTRIBUTION_LIMIT: usize = 10;

/// Everything `check-ids` found.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityInspection {
    /// Identity check over the roster rows
    pub report: IdentityReport,
    /// Most common raw values; empty unless requested
    pub distribution: Vec<ValueFrequency>,
    /// Key-like fields and their uniqueness; empty unless requested
    pub candidates: Vec<FieldUniqueness>,
}

/// Loads the snapshot and checks the roster's identity field.
///
/// Array snapshots are searched fragment by fragment; the first one holding
/// the roster table is used.
///
/// # Errors
/// `InputNotFound` or `Serialization` when the snapshot cannot be read,
/// `TableNotFound` when no fragment holds the roster table.
pub async fn inspect(args: &CheckArgs) -> Result<IdentityInspection> {
    info!("Loading snapshot from {}", args.snapshot.display());
    let snapshot = read_snapshot(&args.snapshot).await?;

    let fragment = snapshot
        .first_with_table(&args.table)
        .ok_or_else(|| CareerSaveError::table_not_found(&args.table))?;

    let Some(rows) = fragment.rows(&args.table) else {
        warn!("Table {} is not a record sequence", args.table);
        return Ok(IdentityInspection {
            report: check_rows(&[], &args.table, &args.field),
            distribution: Vec::new(),
            candidates: Vec::new(),
        });
    };

    let report = check_rows(rows, &args.table, &args.field);
    let (distribution, candidates) = if args.distribution {
        (
            value_distribution(rows, &args.field, DISTRIBUTION_LIMIT),
            candidate_key_fields(rows),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(IdentityInspection {
        report,
        distribution,
        candidates,
    })
}

/// Prints an inspection result.
pub fn print_inspection(inspection: &IdentityInspection) {
    let report = &inspection.report;

    println!("Total {} records: {}", report.table, format_count(report.total_records));
    println!("Valid {} count: {}", report.field, format_count(report.valid_count));
    println!("Unique valid IDs: {}", format_count(report.unique_count));

    if report.has_duplicates() {
        println!("Duplicate IDs found!");
        println!("Sample duplicates:");
        for dup in report.sample_duplicates(DUPLICATE_SAMPLE_LIMIT) {
            println!("  ID {}: {} occurrences", dup.id, dup.count);
        }
    } else {
        println!("All valid IDs are unique.");
    }

    if !inspection.distribution.is_empty() {
        println!();
        println!("Most common {} values:", report.field);
        for entry in &inspection.distribution {
            match &entry.value {
                Some(value) => println!("  {value}: {}", entry.count),
                None => println!("  <missing>: {}", entry.count),
            }
        }
    }

    if !inspection.candidates.is_empty() {
        println!();
        println!("Candidate key fields:");
        for candidate in &inspection.candidates {
            let marker = if candidate.is_unique() { "unique" } else { "not unique" };
            println!(
                "  {}: {} distinct of {} ({marker})",
                candidate.field,
                format_count(candidate.unique_count),
                format_count(candidate.non_null_count)
            );
        }
        if report.has_duplicates() && !inspection.candidates.iter().any(FieldUniqueness::is_unique) {
            println!("No unique key field; use the record position as the key");
        }
    }
}

/// Runs `check-ids` and prints the result.
///
/// # Errors
/// See [`inspect`].
pub async fn check_ids(args: &CheckArgs) -> Result<()> {
    let inspection = inspect(args).await?;
    print_inspection(&inspection);
    Ok(())
}
