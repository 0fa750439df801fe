//! Table statistics for a merged table set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::TableSet;

/// Record counts for a table set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatistics {
    /// Number of distinct table names, including non-sequence tables
    pub table_count: usize,
    /// Sum of record counts over sequence tables
    pub total_records: usize,
    /// Record count per sequence table, in table set order
    pub per_table_counts: IndexMap<String, usize>,
}

/// One entry of the size ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRank {
    /// Table name
    pub table_name: String,
    /// Number of elements in the table
    pub record_count: usize,
}

impl TableStatistics {
    /// Tables sorted by record count, largest first.
    ///
    /// Ties keep table set order (stable sort), so identical input always
    /// yields the same ranking.
    pub fn ranking(&self) -> Vec<TableRank> {
        let mut ranking: Vec<TableRank> = self
            .per_table_counts
            .iter()
            .map(|(name, count)| TableRank {
                table_name: name.clone(),
                record_count: *count,
            })
            .collect();
        ranking.sort_by(|a, b| b.record_count.cmp(&a.record_count));
        ranking
    }

    /// The `limit` largest tables.
    pub fn top(&self, limit: usize) -> Vec<TableRank> {
        let mut ranking = self.ranking();
        ranking.truncate(limit);
        ranking
    }
}

/// Computes per-table and aggregate record counts.
///
/// Tables whose value is not a sequence count towards `table_count` only.
pub fn collect_statistics(tables: &TableSet) -> TableStatistics {
    let mut per_table_counts = IndexMap::new();
    let mut total_records: usize = 0;

    for (name, table) in tables.iter() {
        if let Some(count) = table.record_count() {
            per_table_counts.insert(name.to_string(), count);
            total_records = total_records.saturating_add(count);
        } else {
            tracing::trace!("Table '{}' is not a record sequence; skipped in ranking", name);
        }
    }

    TableStatistics {
        table_count: tables.len(),
        total_records,
        per_table_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use proptest::prelude::*;
    use serde_json::json;

    fn table_set(value: serde_json::Value) -> TableSet {
        TableSet::from_json(value).unwrap()
    }

    #[test]
    fn test_counts_sequences_only() {
        let tables = table_set(json!({
            "players": [{"playerid": 1}, {"playerid": 2}],
            "teams": [{"teamid": 9}],
            "meta": {"version": 21}
        }));

        let stats = collect_statistics(&tables);

        assert_eq!(stats.table_count, 3);
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.per_table_counts.len(), 2);
        assert!(!stats.per_table_counts.contains_key("meta"));
    }

    #[test]
    fn test_counts_non_record_sequences() {
        let tables = table_set(json!({
            "players": [{"playerid": 1, "attrs": [90, 80]}, {"playerid": 2, "info": {"pace": 1}}],
            "names": ["a", "b", "c"],
            "meta": "fc26"
        }));

        let stats = collect_statistics(&tables);

        assert_eq!(stats.table_count, 3);
        assert_eq!(stats.total_records, 5);
        assert_eq!(stats.per_table_counts["names"], 3);
        assert_eq!(stats.top(1)[0].table_name, "names");
    }

    #[test]
    fn test_ranking_descending_with_stable_ties() {
        let tables = table_set(json!({
            "a": [{}],
            "b": [{}, {}, {}],
            "c": [{}],
            "d": [{}, {}, {}],
            "e": []
        }));

        let names: Vec<String> = collect_statistics(&tables)
            .ranking()
            .into_iter()
            .map(|rank| rank.table_name)
            .collect();

        assert_eq!(names, vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn test_top_truncates() {
        let tables = table_set(json!({"a": [{}], "b": [{}, {}], "c": []}));
        let top = collect_statistics(&tables).top(2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].table_name, "b");
        assert_eq!(top[0].record_count, 2);
    }

    #[test]
    fn test_empty_table_set() {
        let stats = collect_statistics(&TableSet::new());
        assert_eq!(stats, TableStatistics::default());
        assert!(stats.ranking().is_empty());
    }

    proptest! {
        #[test]
        fn prop_counts_are_consistent(
            tables in prop::collection::vec(("[a-h]{1,3}", prop::option::of(0usize..20)), 0..12)
        ) {
            let set = tables.into_iter().fold(TableSet::new(), |set, (name, rows)| match rows {
                Some(n) => set.with_table(name, vec![Record::new(); n]),
                None => set.with_table(name, crate::models::TableValue::Opaque(json!(null))),
            });

            let stats = collect_statistics(&set);
            prop_assert_eq!(stats.per_table_counts.values().sum::<usize>(), stats.total_records);
            prop_assert!(stats.per_table_counts.len() <= stats.table_count);
            prop_assert_eq!(stats.ranking().len(), stats.per_table_counts.len());
        }
    }
}
