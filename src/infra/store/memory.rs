//! In-process collection store.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::application::store::{
    CollectionQuery, CollectionStore, Document, SortDirection, StoreError, StoredDocument,
};

use super::value_order::compare_values;

type DocumentKey = (String, String);

static MISSING: Value = Value::Null;

/// Documents held in a concurrent map keyed by `(collection, key)`.
///
/// Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<DashMap<DocumentKey, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count()
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn key(collection: &str, key: &str) -> DocumentKey {
        (collection.to_string(), key.to_string())
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .documents
            .get(&Self::key(collection, key))
            .map(|entry| entry.value().clone()))
    }

    async fn set(&self, collection: &str, key: &str, document: Document) -> Result<(), StoreError> {
        self.documents.insert(Self::key(collection, key), document);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .documents
            .get_mut(&Self::key(collection, key))
            .ok_or_else(|| StoreError::not_found(collection, key))?;
        entry.value_mut().extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        self.documents.remove(&Self::key(collection, key));
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &CollectionQuery,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let field = query.order_by.as_str();

        let mut rows: Vec<StoredDocument> = self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == collection && entry.value().contains_key(field))
            .map(|entry| StoredDocument {
                key: entry.key().1.clone(),
                body: entry.value().clone(),
            })
            .collect();

        let ascending = |left: &StoredDocument, right: &StoredDocument| -> Ordering {
            compare_values(field_of(left, field), field_of(right, field))
                .then_with(|| left.key.cmp(&right.key))
        };
        let ordered = |left: &StoredDocument, right: &StoredDocument| match query.direction {
            SortDirection::Ascending => ascending(left, right),
            SortDirection::Descending => ascending(right, left),
        };

        rows.sort_by(ordered);

        if let Some(start) = query.start_after.as_ref() {
            rows.retain(|row| {
                let position = compare_values(field_of(row, field), &start.value)
                    .then_with(|| row.key.as_str().cmp(start.key.as_str()));
                match query.direction {
                    SortDirection::Ascending => position == Ordering::Greater,
                    SortDirection::Descending => position == Ordering::Less,
                }
            });
        }

        rows.truncate(query.limit as usize);
        Ok(rows)
    }

    async fn aggregate_sum(&self, collection: &str, field: &str) -> Result<i64, StoreError> {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .filter_map(|entry| entry.value().get(field).and_then(|value| value.as_i64()))
            .try_fold(0_i64, |total, value| total.checked_add(value))
            .ok_or_else(|| StoreError::SumOverflow {
                collection: collection.to_string(),
                field: field.to_string(),
            })
    }
}

fn field_of<'a>(row: &'a StoredDocument, field: &str) -> &'a Value {
    row.body.get(field).unwrap_or(&MISSING)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::store::StartAfter;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("documents are objects"),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (key, stamp) in [("a", 30), ("b", 10), ("c", 20), ("d", 20)] {
            store
                .set("meta", key, doc(json!({ "lastUpdated": stamp })))
                .await
                .expect("set");
        }
        store
            .set("meta", "undated", doc(json!({ "title": "no stamp" })))
            .await
            .expect("set");
        store
            .set("other", "x", doc(json!({ "lastUpdated": 99 })))
            .await
            .expect("set");
        store
    }

    fn keys(rows: &[StoredDocument]) -> Vec<&str> {
        rows.iter().map(|row| row.key.as_str()).collect()
    }

    #[tokio::test]
    async fn query_orders_by_field_then_key_and_skips_missing_fields() {
        let store = seeded().await;
        let query = CollectionQuery {
            order_by: "lastUpdated".into(),
            direction: SortDirection::Descending,
            limit: 10,
            start_after: None,
        };

        let rows = store.query("meta", &query).await.expect("query");
        assert_eq!(keys(&rows), vec!["a", "d", "c", "b"]);
    }

    #[tokio::test]
    async fn start_after_resumes_strictly_after_the_cursor() {
        let store = seeded().await;
        let query = CollectionQuery {
            order_by: "lastUpdated".into(),
            direction: SortDirection::Descending,
            limit: 2,
            start_after: Some(StartAfter {
                value: json!(20),
                key: "d".into(),
            }),
        };

        let rows = store.query("meta", &query).await.expect("query");
        assert_eq!(keys(&rows), vec!["c", "b"]);

        let ascending = CollectionQuery {
            direction: SortDirection::Ascending,
            start_after: Some(StartAfter {
                value: json!(20),
                key: "c".into(),
            }),
            ..query
        };
        let rows = store.query("meta", &ascending).await.expect("query");
        assert_eq!(keys(&rows), vec!["d", "a"]);
    }

    #[tokio::test]
    async fn update_merges_and_requires_an_existing_document() {
        let store = MemoryStore::new();
        let err = store
            .update("meta", "ghost", doc(json!({ "isPublic": true })))
            .await
            .expect_err("absent key");
        assert!(matches!(err, StoreError::NotFound { .. }));

        store
            .set("meta", "p", doc(json!({ "title": "t", "isPublic": false })))
            .await
            .expect("set");
        store
            .update("meta", "p", doc(json!({ "isPublic": true })))
            .await
            .expect("update");

        let stored = store.get("meta", "p").await.expect("get").expect("present");
        assert_eq!(Value::Object(stored), json!({ "title": "t", "isPublic": true }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store
            .set("meta", "p", doc(json!({})))
            .await
            .expect("set");

        store.delete("meta", "p").await.expect("first delete");
        store.delete("meta", "p").await.expect("second delete");
        assert!(store.is_empty("meta"));
    }

    #[tokio::test]
    async fn aggregate_sum_ignores_non_integer_fields() {
        let store = MemoryStore::new();
        store
            .set("counts", "a", doc(json!({ "readCount": 5 })))
            .await
            .expect("set");
        store
            .set("counts", "b", doc(json!({ "readCount": 7 })))
            .await
            .expect("set");
        store
            .set("counts", "c", doc(json!({ "readCount": "lots" })))
            .await
            .expect("set");
        store
            .set("counts", "d", doc(json!({})))
            .await
            .expect("set");

        let total = store
            .aggregate_sum("counts", "readCount")
            .await
            .expect("sum");
        assert_eq!(total, 12);
        assert_eq!(store.aggregate_sum("empty", "readCount").await.expect("sum"), 0);
    }

    #[tokio::test]
    async fn aggregate_sum_reports_overflow() {
        let store = MemoryStore::new();
        for key in ["a", "b"] {
            store
                .set("counts", key, doc(json!({ "readCount": i64::MAX })))
                .await
                .expect("set");
        }

        let err = store
            .aggregate_sum("counts", "readCount")
            .await
            .expect_err("overflow");
        assert!(matches!(
            err,
            StoreError::SumOverflow { ref collection, ref field }
                if collection == "counts" && field == "readCount"
        ));
    }
}
