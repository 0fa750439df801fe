//! Report assembly and snapshot persistence.
//!
//! This module combines statistics, critical-table presence and the identity
//! check into a [`ValidationReport`], and writes the merged table set to the
//! JSON snapshot read back by the standalone integrity check.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::critical::{CriticalTableReport, TableCount};
use crate::error::{CareerSaveError, Result};
use crate::identity::{DuplicateIdentity, IdentityReport};
use crate::merge::merge_fragments;
use crate::models::{DecodedOutput, Record, Scalar, TableSet};
use crate::stats::{TableRank, TableStatistics};

/// Fields shown in the record preview.
pub const PREVIEW_FIELDS: &[&str] = &[
    "firstname",
    "surname",
    "overallrating",
    "potential",
    "age",
    "preferredposition1",
];

/// Placeholder for preview fields without a usable value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Overall classification of a run that produced a merged table set.
///
/// Pipeline errors are never a status; they surface as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Every critical table is present
    CompleteSuccess,
    /// Some critical tables are missing; the save is still usable
    PartialSuccess,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::CompleteSuccess => write!(f, "COMPLETE SUCCESS"),
            RunStatus::PartialSuccess => write!(f, "PARTIAL SUCCESS"),
        }
    }
}

/// Display values of a few fields of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPreview {
    /// Table the record came from
    pub table: String,
    /// Field name to display value, in [`PREVIEW_FIELDS`] order
    pub fields: IndexMap<String, String>,
}

impl RecordPreview {
    /// Builds a preview of `record`.
    ///
    /// Missing, null, empty, zero and `false` values render as `N/A`.
    pub fn from_record(table: impl Into<String>, record: &Record) -> Self {
        let fields = PREVIEW_FIELDS
            .iter()
            .map(|name| {
                let value = record
                    .get(name)
                    .scalar()
                    .filter(|scalar| has_display_value(scalar))
                    .map_or_else(|| NOT_AVAILABLE.to_string(), ToString::to_string);
                ((*name).to_string(), value)
            })
            .collect();

        Self {
            table: table.into(),
            fields,
        }
    }

    /// Previews the first record of `table`, if there is one.
    pub fn first_of(tables: &TableSet, table: &str) -> Option<Self> {
        tables
            .rows(table)
            .and_then(<[Record]>::first)
            .map(|record| Self::from_record(table, record))
    }

    /// Display value of a preview field.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map_or(NOT_AVAILABLE, String::as_str)
    }
}

fn has_display_value(scalar: &Scalar) -> bool {
    match scalar {
        Scalar::Null => false,
        Scalar::Bool(b) => *b,
        Scalar::Number(_) => !scalar.is_zero(),
        Scalar::String(s) => !s.is_empty(),
        Scalar::Nested(_) => true,
    }
}

/// Outputs of the read-only validators plus run metadata.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    /// Table and record counts
    pub statistics: TableStatistics,
    /// Critical table presence
    pub critical: CriticalTableReport,
    /// `None` when the identity table is absent from the merged set
    pub identity: Option<IdentityReport>,
    /// First record of the preview table, if any
    pub preview: Option<RecordPreview>,
    /// Databases the save decoded into
    pub fragment_count: usize,
    /// Wall-clock decode time
    pub decode_time: Duration,
}

/// Summary of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Overall verdict
    pub status: RunStatus,
    /// Tables in the merged set
    pub table_count: usize,
    /// Elements across all sequence tables
    pub total_records: usize,
    /// Databases the save decoded into
    pub fragment_count: usize,
    /// Absent critical tables, in required-list order
    pub missing_critical_tables: Vec<String>,
    /// Present critical tables with their counts
    pub present_critical_tables: IndexMap<String, TableCount>,
    /// Identifiers occurring more than once
    pub duplicate_identity_summary: Vec<DuplicateIdentity>,
    /// Full identity check, `None` when the roster table is absent
    pub identity: Option<IdentityReport>,
    /// Every sequence table, largest first
    pub top_tables: Vec<TableRank>,
    /// Decode time in seconds
    pub decode_seconds: f64,
    /// First record of the preview table, if any
    pub preview: Option<RecordPreview>,
}

impl ValidationReport {
    /// Combines validator outputs into a report.
    pub fn assemble(inputs: ReportInputs) -> Self {
        let status = if inputs.critical.is_complete() {
            RunStatus::CompleteSuccess
        } else {
            RunStatus::PartialSuccess
        };

        if inputs.statistics.table_count == 0 {
            tracing::warn!("Merged table set is empty; every critical table is missing");
        }

        let duplicate_identity_summary = inputs
            .identity
            .as_ref()
            .map(|identity| identity.duplicates.clone())
            .unwrap_or_default();

        Self {
            status,
            table_count: inputs.statistics.table_count,
            total_records: inputs.statistics.total_records,
            fragment_count: inputs.fragment_count,
            top_tables: inputs.statistics.ranking(),
            missing_critical_tables: inputs.critical.missing,
            present_critical_tables: inputs.critical.present,
            duplicate_identity_summary,
            identity: inputs.identity,
            decode_seconds: inputs.decode_time.as_secs_f64(),
            preview: inputs.preview,
        }
    }

    /// Returns true when every critical table is present.
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::CompleteSuccess
    }

    /// The `limit` largest tables.
    pub fn top_tables(&self, limit: usize) -> &[TableRank] {
        &self.top_tables[..self.top_tables.len().min(limit)]
    }
}

/// Writes the merged table set as pretty-printed JSON (2-space indent).
///
/// Parent directories are created as needed.
///
/// # Errors
/// Every failure maps to `PersistFailed`, distinct from decode and merge errors.
pub async fn persist_snapshot(tables: &TableSet, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CareerSaveError::persist_failed(path, e))?;
    }

    let json_data =
        serde_json::to_string_pretty(tables).map_err(|e| CareerSaveError::persist_failed(path, e))?;

    tokio::fs::write(path, json_data)
        .await
        .map_err(|e| CareerSaveError::persist_failed(path, e))?;

    tracing::debug!("Snapshot written to {}", path.display());
    Ok(path.to_path_buf())
}

/// Reads a snapshot without merging.
///
/// Older snapshots may hold the decoder's array of databases verbatim.
pub async fn read_snapshot(path: &Path) -> Result<DecodedOutput> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CareerSaveError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CareerSaveError::Io {
                context: format!("Failed to read snapshot {}", path.display()),
                source: e,
            }
        }
    })?;

    let value: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|e| CareerSaveError::Serialization {
            context: format!("Snapshot {} is not valid JSON", path.display()),
            source: e,
        })?;

    DecodedOutput::from_json(value)
}

/// Reads a snapshot back into a merged table set.
pub async fn load_snapshot(path: &Path) -> Result<TableSet> {
    read_snapshot(path).await.map(merge_fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical::validate_critical_tables;
    use crate::identity::check_identity;
    use crate::stats::collect_statistics;
    use crate::models::TableValue;
    use serde_json::json;

    fn inputs_for(tables: &TableSet, required: &[&str]) -> ReportInputs {
        ReportInputs {
            statistics: collect_statistics(tables),
            critical: validate_critical_tables(tables, required),
            identity: check_identity(tables, "players", "playerid").ok(),
            preview: RecordPreview::first_of(tables, "players"),
            fragment_count: 1,
            decode_time: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_complete_success() {
        let tables = TableSet::from_json(json!({"A": [{}], "players": [{"playerid": 1}]})).unwrap();
        let report = ValidationReport::assemble(inputs_for(&tables, &["A"]));

        assert_eq!(report.status, RunStatus::CompleteSuccess);
        assert!(report.is_complete());
        assert!(report.missing_critical_tables.is_empty());
        assert_eq!(report.table_count, 2);
        assert_eq!(report.total_records, 2);
        assert!((report.decode_seconds - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_success_lists_missing() {
        let tables = TableSet::from_json(json!({"A": [{}], "C": [{}, {}]})).unwrap();
        let report = ValidationReport::assemble(inputs_for(&tables, &["A", "B", "C"]));

        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.missing_critical_tables, vec!["B"]);
        assert_eq!(report.present_critical_tables["C"], TableCount::Records(2));
        assert!(report.identity.is_none());
        assert!(report.duplicate_identity_summary.is_empty());
    }

    #[test]
    fn test_empty_table_set_is_partial() {
        let report = ValidationReport::assemble(inputs_for(&TableSet::new(), &["A"]));
        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.table_count, 0);
    }

    #[test]
    fn test_duplicate_summary_from_identity() {
        let tables = TableSet::from_json(json!({
            "players": [{"playerid": 4}, {"playerid": 4}, {"playerid": 0}]
        }))
        .unwrap();
        let report = ValidationReport::assemble(inputs_for(&tables, &[]));

        assert_eq!(report.duplicate_identity_summary.len(), 1);
        assert_eq!(report.duplicate_identity_summary[0].count, 2);
        assert_eq!(report.identity.as_ref().unwrap().valid_count, 2);
    }

    #[test]
    fn test_top_tables_ranking() {
        let tables = TableSet::from_json(json!({"a": [{}], "b": [{}, {}], "c": "x"})).unwrap();
        let report = ValidationReport::assemble(inputs_for(&tables, &[]));

        assert_eq!(report.top_tables.len(), 2);
        assert_eq!(report.top_tables(1)[0].table_name, "b");
        assert_eq!(report.top_tables(10).len(), 2);
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_value(RunStatus::PartialSuccess).unwrap(),
            json!("PARTIAL_SUCCESS")
        );
        assert_eq!(RunStatus::CompleteSuccess.to_string(), "COMPLETE SUCCESS");
    }

    #[test]
    fn test_record_preview_placeholders() {
        let tables = TableSet::from_json(json!({
            "career_playergrowthuserseason": [
                {"firstname": "Rui", "surname": "", "overallrating": 78, "potential": 0, "age": null}
            ]
        }))
        .unwrap();

        let preview = RecordPreview::first_of(&tables, "career_playergrowthuserseason").unwrap();

        assert_eq!(preview.field("firstname"), "Rui");
        assert_eq!(preview.field("surname"), "N/A");
        assert_eq!(preview.field("overallrating"), "78");
        assert_eq!(preview.field("potential"), "N/A");
        assert_eq!(preview.field("age"), "N/A");
        assert_eq!(preview.field("preferredposition1"), "N/A");
        assert_eq!(preview.fields.len(), PREVIEW_FIELDS.len());
    }

    #[test]
    fn test_record_preview_absent_or_empty_table() {
        let tables = TableSet::from_json(json!({"players": []})).unwrap();
        assert!(RecordPreview::first_of(&tables, "players").is_none());
        assert!(RecordPreview::first_of(&tables, "career_users").is_none());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("test_parse.json");
        let tables = TableSet::from_json(json!({
            "players": [{"playerid": 1, "surname": "Costa", "height": 181.5, "retired": false}],
            "meta": {"save": "CmMgrC1", "slots": [1, 2]},
            "career_users": []
        }))
        .unwrap();

        let written = persist_snapshot(&tables, &path).await.unwrap();
        assert_eq!(written, path);

        let loaded = load_snapshot(&path).await.unwrap();
        assert_eq!(loaded, tables);
        let names: Vec<&str> = loaded.table_names().collect();
        assert_eq!(names, vec!["players", "meta", "career_users"]);
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_keeps_non_record_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_parse.json");
        let tables = TableSet::new()
            .with_table("names", TableValue::Opaque(json!(["a", "b", "c"])))
            .with_table("mixed", TableValue::Opaque(json!([{"id": 1}, 2])))
            .with_table("blob", TableValue::Opaque(json!({"k": [1]})))
            .with_table(
                "players",
                vec![Record::new().with_field("playerid", 7).with_field(
                    "attrs",
                    Scalar::Nested(json!({"pace": 90})),
                )],
            );

        persist_snapshot(&tables, &path).await.unwrap();
        let loaded = load_snapshot(&path).await.unwrap();

        assert_eq!(loaded, tables);
        assert_eq!(collect_statistics(&loaded).total_records, 6);
    }

    #[tokio::test]
    async fn test_snapshot_uses_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let tables = TableSet::from_json(json!({"T": [{"id": 1}]})).unwrap();

        persist_snapshot(&tables, &path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert_eq!(text, "{\n  \"T\": [\n    {\n      \"id\": 1\n    }\n  ]\n}");
    }

    #[tokio::test]
    async fn test_snapshot_persist_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let path = blocker.join("test_parse.json");

        let err = persist_snapshot(&TableSet::new(), &path).await.unwrap_err();
        assert!(matches!(err, CareerSaveError::PersistFailed { .. }));
        assert!(!err.is_decode_stage());
    }

    #[tokio::test]
    async fn test_snapshot_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, CareerSaveError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_array_is_merged_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(&path, r#"[{"T": [{"id": 1}]}, {"T": [{"id": 2}], "U": []}]"#).unwrap();

        let loaded = load_snapshot(&path).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.rows("T").unwrap().len(), 1);

        let raw = read_snapshot(&path).await.unwrap();
        assert_eq!(raw.fragment_count(), 2);
    }
}
