//! Property tests for normalization and grid ordering.

use std::collections::HashSet;
use std::sync::Arc;

use oi_catalog::grid::GridQuery;
use oi_catalog::{normalize, DataWarning, GridViewModel, SortDirection};
use oi_core::{ArticleField, ArticleRow};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Small id and title alphabets so duplicates and sort ties are common.
fn record_strategy() -> impl Strategy<Value = Value> {
    (
        prop::option::of(prop::sample::select(vec!["a", "b", "c", "d", ""])),
        prop::option::of(prop::sample::select(vec!["Rust", "Go", "rust", ""])),
        prop::option::of(prop::sample::select(vec![
            "https://qiita.com/items/1",
            "not a url",
        ])),
        prop::option::of(prop::sample::select(vec![
            "2020-06-10 01:34:37",
            "2021-01-03T15:31:12+09:00",
            "garbage",
        ])),
        any::<bool>(),
    )
        .prop_map(|(id, title, url, created_at, malformed)| {
            if malformed {
                return json!([id, title]);
            }
            let mut record = json!({
                "media": "qiita",
                "crawledAt": "2022-12-19 14:31:33"
            });
            if let Some(id) = id {
                record["id"] = json!(id);
            }
            if let Some(title) = title {
                record["title"] = json!(title);
            }
            if let Some(url) = url {
                record["url"] = json!(url);
            }
            if let Some(created_at) = created_at {
                record["createdAt"] = json!(created_at);
            }
            record
        })
}

fn is_complete(record: &Value) -> bool {
    let text = |key: &str| record.get(key).and_then(Value::as_str);
    text("id").is_some_and(|id| !id.trim().is_empty())
        && text("title").is_some()
        && text("media").is_some()
        && text("url").is_some()
        && text("createdAt").is_some_and(|t| oi_core::parse_timestamp(t).is_some())
        && text("crawledAt").is_some_and(|t| oi_core::parse_timestamp(t).is_some())
}

proptest! {
    #[test]
    fn prop_output_ids_are_unique(records in prop::collection::vec(record_strategy(), 0..40)) {
        let out = normalize(&records);
        let ids: HashSet<_> = out.rows.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(ids.len(), out.rows.len());
    }

    #[test]
    fn prop_dropped_records_are_exactly_the_incomplete_ones(
        records in prop::collection::vec(record_strategy(), 0..40)
    ) {
        let out = normalize(&records);

        let dropped: HashSet<usize> = out
            .warnings
            .iter()
            .filter_map(|w| match w {
                DataWarning::MissingField { position, .. }
                | DataWarning::MalformedRecord { position } => Some(*position),
                _ => None,
            })
            .collect();
        let incomplete: HashSet<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| !is_complete(r))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(&dropped, &incomplete);

        let complete_ids: HashSet<&str> = records
            .iter()
            .filter(|r| is_complete(r))
            .filter_map(|r| r.get("id").and_then(Value::as_str))
            .collect();
        let row_ids: HashSet<&str> = out.rows.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(row_ids, complete_ids);
        for row in &out.rows {
            prop_assert!(!row.id.trim().is_empty());
        }
    }

    #[test]
    fn prop_sorting_is_stable_and_repeatable(
        records in prop::collection::vec(record_strategy(), 0..40),
        field in prop::sample::select(ArticleField::ALL.to_vec()),
        descending in any::<bool>(),
    ) {
        let rows: Arc<[ArticleRow]> = normalize(&records).rows.into();
        let mut query = GridQuery::default();
        let direction = if descending { SortDirection::Descending } else { SortDirection::Ascending };
        query.set_sort(field, direction);

        let first: Vec<ArticleRow> = GridViewModel::derive(Arc::clone(&rows), &query).iter().cloned().collect();
        let second: Vec<ArticleRow> = GridViewModel::derive(Arc::clone(&rows), &query).iter().cloned().collect();
        prop_assert_eq!(&first, &second);

        // Equal keys stay in snapshot order.
        let position = |row: &ArticleRow| rows.iter().position(|r| r.id == row.id);
        for pair in first.windows(2) {
            let same_key = match field {
                f if f.is_timestamp() => pair[0].timestamp(f) == pair[1].timestamp(f),
                f => pair[0].text(f) == pair[1].text(f),
            };
            if same_key {
                prop_assert!(position(&pair[0]) < position(&pair[1]));
            }
        }
    }
}
