//! Identity integrity checks.
//!
//! Scans the identity field of one table (the player roster's `playerid`
//! by default) for placeholder and duplicate values. Missing, `null` and
//! numeric zero identifiers are unassigned placeholders: they are excluded
//! from both the valid count and the duplicate scan.

use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CareerSaveError, Result};
use crate::models::{FieldValue, Record, Scalar, TableSet};

/// Number of duplicate identifiers surfaced in user-facing output.
pub const DUPLICATE_SAMPLE_LIMIT: usize = 5;

/// An identifier that occurs more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateIdentity {
    /// The identifier as first seen in the table
    pub id: Scalar,
    /// Number of records carrying it
    pub count: u64,
}

/// Result of an identity integrity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityReport {
    /// Table that was checked
    pub table: String,
    /// Identity field name
    pub field: String,
    /// Records in the table
    pub total_records: usize,
    /// Records with an assigned (non-missing, non-null, non-zero) identifier
    pub valid_count: usize,
    /// Distinct assigned identifiers
    pub unique_count: usize,
    /// Every identifier with count > 1, ordered by first occurrence
    pub duplicates: Vec<DuplicateIdentity>,
}

impl IdentityReport {
    fn empty(table: &str, field: &str) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            total_records: 0,
            valid_count: 0,
            unique_count: 0,
            duplicates: Vec::new(),
        }
    }

    /// Returns true if any assigned identifier repeats.
    pub fn has_duplicates(&self) -> bool {
        self.unique_count < self.valid_count
    }

    /// Records excluded as placeholders.
    pub fn placeholder_count(&self) -> usize {
        self.total_records.saturating_sub(self.valid_count)
    }

    /// The first `limit` duplicates, for display. Counting is unaffected.
    pub fn sample_duplicates(&self, limit: usize) -> &[DuplicateIdentity] {
        &self.duplicates[..self.duplicates.len().min(limit)]
    }

    /// Occurrence count of a duplicated identifier.
    pub fn duplicate_count(&self, id: &Scalar) -> Option<u64> {
        let key = IdentityKey::from_scalar(id);
        self.duplicates
            .iter()
            .find(|dup| IdentityKey::from_scalar(&dup.id) == key)
            .map(|dup| dup.count)
    }
}

/// Hashable form of an identifier.
///
/// Integral floats fold into integers so `2.0` and `2` are the same player;
/// strings never equal numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IdentityKey {
    Missing,
    Null,
    Bool(bool),
    Integer(i128),
    Float(u64),
    Text(String),
    Nested(String),
}

impl IdentityKey {
    fn from_field(value: FieldValue<'_>) -> Self {
        match value {
            FieldValue::Missing => Self::Missing,
            FieldValue::Present(scalar) => Self::from_scalar(scalar),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_scalar(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Self::Null,
            Scalar::Bool(b) => Self::Bool(*b),
            Scalar::String(s) => Self::Text(s.clone()),
            Scalar::Nested(value) => Self::Nested(value.to_string()),
            Scalar::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Self::Integer(i128::from(u))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e36 {
                        Self::Integer(f as i128)
                    } else {
                        Self::Float(f.to_bits())
                    }
                }
            }
        }
    }
}

/// Returns true when the identity field holds an assigned identifier.
fn is_assigned(value: FieldValue<'_>) -> bool {
    match value {
        FieldValue::Missing => false,
        FieldValue::Present(Scalar::Nested(_)) => false,
        FieldValue::Present(scalar) => !scalar.is_null() && !scalar.is_zero(),
    }
}

/// Counts occurrences per key, keeping first-seen order and value.
fn tally<'a, K, I>(values: I) -> IndexMap<K, (Option<&'a Scalar>, u64)>
where
    K: Hash + Eq,
    I: IntoIterator<Item = (K, Option<&'a Scalar>)>,
{
    let mut counts: IndexMap<K, (Option<&'a Scalar>, u64)> = IndexMap::new();
    for (key, value) in values {
        counts.entry(key).or_insert((value, 0)).1 += 1;
    }
    counts
}

/// Checks the identity field of `table` for placeholders and duplicates.
///
/// # Errors
/// Returns `TableNotFound` if `table` is absent. A present table that is
/// empty or not a record sequence yields a report with `valid_count == 0`.
pub fn check_identity(tables: &TableSet, table: &str, field: &str) -> Result<IdentityReport> {
    let value = tables
        .get(table)
        .ok_or_else(|| CareerSaveError::table_not_found(table))?;

    let Some(rows) = value.rows() else {
        tracing::warn!(
            "Table '{}' is not a record sequence; no identifiers to check",
            table
        );
        return Ok(IdentityReport::empty(table, field));
    };

    Ok(check_rows(rows, table, field))
}

/// Identity check over an already-selected row slice.
pub fn check_rows(rows: &[Record], table: &str, field: &str) -> IdentityReport {
    let counts = tally(
        rows.iter()
            .map(|row| row.get(field))
            .filter(|value| is_assigned(*value))
            .map(|value| (IdentityKey::from_field(value), value.scalar())),
    );

    let valid_count = counts.values().map(|(_, n)| *n).sum::<u64>();
    let valid_count = usize::try_from(valid_count).unwrap_or(usize::MAX);
    let unique_count = counts.len();

    let duplicates = if unique_count < valid_count {
        counts
            .into_values()
            .filter(|(_, count)| *count > 1)
            .filter_map(|(id, count)| id.map(|id| DuplicateIdentity { id: id.clone(), count }))
            .collect()
    } else {
        Vec::new()
    };

    tracing::debug!(
        "Identity check on {}.{}: {} valid, {} unique, {} duplicated ids",
        table,
        field,
        valid_count,
        unique_count,
        duplicates.len()
    );

    IdentityReport {
        table: table.to_string(),
        field: field.to_string(),
        total_records: rows.len(),
        valid_count,
        unique_count,
        duplicates,
    }
}

/// One entry of a raw value distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFrequency {
    /// The raw value; `None` when the field is missing
    pub value: Option<Scalar>,
    /// Number of records carrying the value
    pub count: u64,
}

/// Most common raw values of `field`, placeholders included.
///
/// Sorted by count descending; ties keep first-seen order.
pub fn value_distribution(rows: &[Record], field: &str, limit: usize) -> Vec<ValueFrequency> {
    let counts = tally(
        rows.iter()
            .map(|row| row.get(field))
            .map(|value| (IdentityKey::from_field(value), value.scalar())),
    );

    let mut distribution: Vec<ValueFrequency> = counts
        .into_values()
        .map(|(value, count)| ValueFrequency {
            value: value.cloned(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution.truncate(limit);
    distribution
}

/// Uniqueness of one candidate key field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUniqueness {
    /// Candidate field name
    pub field: String,
    /// Records where the field is present and not null
    pub non_null_count: usize,
    /// Distinct non-null values
    pub unique_count: usize,
}

impl FieldUniqueness {
    /// Returns true if every non-null value is distinct.
    pub fn is_unique(&self) -> bool {
        self.non_null_count > 0 && self.unique_count == self.non_null_count
    }
}

/// Scans fields that look like keys for uniqueness.
///
/// Candidates are the first record's fields whose name contains `id`
/// (case-insensitive) or is `index` or `row`.
pub fn candidate_key_fields(rows: &[Record]) -> Vec<FieldUniqueness> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    first
        .field_names()
        .filter(|name| {
            name.to_lowercase().contains("id") || matches!(*name, "index" | "row")
        })
        .map(|field| {
            let keys: Vec<IdentityKey> = rows
                .iter()
                .filter_map(|row| row.get(field).scalar())
                .filter(|scalar| !scalar.is_null())
                .map(IdentityKey::from_scalar)
                .collect();
            let unique_count = tally(keys.iter().map(|key| (key, None))).len();
            FieldUniqueness {
                field: field.to_string(),
                non_null_count: keys.len(),
                unique_count,
            }
        })
        .collect()
}
