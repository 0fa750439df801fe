//! Fragment merging.
//!
//! A save can decode into several sub-databases that dump overlapping table
//! names. Fragments are folded left to right and a later fragment's table
//! replaces the earlier one wholesale; rows are never concatenated and
//! records are never merged field by field.

use crate::models::{DecodedOutput, Fragment, TableSet};

/// Folds decoder output into one merged table set.
///
/// A replaced table keeps the position where its name first appeared, so the
/// merged order matches the order in which table names were first seen.
pub fn merge_fragments(output: DecodedOutput) -> TableSet {
    match output {
        DecodedOutput::Single(fragment) => fragment,
        DecodedOutput::Many(fragments) => merge_all(fragments),
    }
}

/// Merges an ordered sequence of fragments, last table wins.
pub fn merge_all<I>(fragments: I) -> TableSet
where
    I: IntoIterator<Item = Fragment>,
{
    fragments
        .into_iter()
        .enumerate()
        .fold(TableSet::new(), |mut merged, (index, fragment)| {
            for (name, table) in fragment {
                if merged.insert(name.as_str(), table).is_some() {
                    tracing::debug!(
                        "Table '{}' replaced by database {} (last fragment wins)",
                        name,
                        index
                    );
                }
            }
            merged
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Record, TableValue};
    use proptest::prelude::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> DecodedOutput {
        DecodedOutput::from_json(value).unwrap()
    }

    #[test]
    fn test_last_fragment_wins() {
        let merged = merge_fragments(decode(json!([
            {"T": [{"id": 1}]},
            {"T": [{"id": 2}], "U": [{"id": 3}]}
        ])));

        let expected = TableSet::from_json(json!({"T": [{"id": 2}], "U": [{"id": 3}]})).unwrap();
        assert_eq!(merged, expected);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_replacement_is_not_append() {
        let merged = merge_fragments(decode(json!([
            {"players": [{"playerid": 1}, {"playerid": 2}]},
            {"players": [{"playerid": 3}]}
        ])));

        assert_eq!(merged.rows("players").unwrap().len(), 1);
    }

    #[test]
    fn test_replacement_keeps_first_position() {
        let merged = merge_fragments(decode(json!([
            {"A": [], "B": []},
            {"C": [], "A": [{"x": 1}]}
        ])));

        let names: Vec<&str> = merged.table_names().collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(merged.rows("A").unwrap().len(), 1);
    }

    #[test]
    fn test_single_fragment_passthrough() {
        let fragment = TableSet::new()
            .with_table("teams", vec![Record::new().with_field("teamid", 1)])
            .with_table("meta", TableValue::Opaque(json!("fc26")));

        let merged = merge_fragments(DecodedOutput::Single(fragment.clone()));
        assert_eq!(merged, fragment);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(merge_fragments(DecodedOutput::Many(vec![])).is_empty());
    }

    #[test]
    fn test_opaque_value_replaces_rows() {
        let merged = merge_fragments(decode(json!([{"T": [{"id": 1}]}, {"T": "blob"}])));
        assert_eq!(merged.get("T"), Some(&TableValue::Opaque(json!("blob"))));
    }

    fn arb_fragment() -> impl Strategy<Value = TableSet> {
        prop::collection::vec(("[a-e]", prop::collection::vec(0i64..5, 0..4)), 0..6).prop_map(
            |tables| {
                tables.into_iter().fold(TableSet::new(), |set, (name, ids)| {
                    let rows: Vec<Record> = ids
                        .into_iter()
                        .map(|id| Record::new().with_field("id", id))
                        .collect();
                    set.with_table(name, rows)
                })
            },
        )
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(fragment in arb_fragment()) {
            let once = merge_all(vec![fragment.clone()]);
            let twice = merge_all(vec![fragment.clone(), fragment]);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_merged_names_are_union(a in arb_fragment(), b in arb_fragment()) {
            let merged = merge_all(vec![a.clone(), b.clone()]);
            for name in a.table_names().chain(b.table_names()) {
                prop_assert!(merged.contains(name));
            }
            for (name, table) in b.iter() {
                prop_assert_eq!(merged.get(name), Some(table));
            }
        }
    }
}
