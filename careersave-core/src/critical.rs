//! Presence checks for the tables downstream features depend on.
//!
//! A save with some critical tables absent is still usable, so absence is
//! reported rather than raised.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::TableSet;

/// Tables the career features are built on.
pub const DEFAULT_CRITICAL_TABLES: &[&str] = &[
    "career_playergrowthuserseason",
    "career_playerlastgrowth",
    "career_playercontract",
    "career_managerinfo",
    "career_users",
];

/// Record count of a present critical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableCount {
    /// The table is a sequence of this length
    Records(usize),
    /// The table exists but is not a sequence
    NotCountable,
}

impl fmt::Display for TableCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableCount::Records(n) => write!(f, "{}", n),
            TableCount::NotCountable => write!(f, "N/A"),
        }
    }
}

/// Outcome of checking the required table list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalTableReport {
    /// Present tables with their counts, in required-list order
    pub present: IndexMap<String, TableCount>,
    /// Absent tables, in required-list order
    pub missing: Vec<String>,
}

impl CriticalTableReport {
    /// Returns true when every required table is present.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Checks `required` against the merged table set.
///
/// A table is present iff its name is a key of `tables`, whatever its value.
pub fn validate_critical_tables<S: AsRef<str>>(
    tables: &TableSet,
    required: &[S],
) -> CriticalTableReport {
    let mut report = CriticalTableReport::default();

    for name in required.iter().map(AsRef::as_ref) {
        match tables.get(name) {
            Some(table) => {
                let count = table
                    .record_count()
                    .map_or(TableCount::NotCountable, TableCount::Records);
                tracing::debug!("Critical table {}: {} records", name, count);
                report.present.insert(name.to_string(), count);
            }
            None => {
                tracing::debug!("Critical table {}: MISSING", name);
                report.missing.push(name.to_string());
            }
        }
    }

    report
}
