//! Collection store capability consumed by the post engine.
//!
//! The store is a keyed document collaborator: every call is an independent,
//! possibly failing remote operation and no cross-collection transaction is
//! assumed.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document `{key}` not found in `{collection}`")]
    NotFound { collection: String, key: String },
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },
    #[error("sum of `{field}` in `{collection}` overflows a 64-bit integer")]
    SumOverflow { collection: String, field: String },
    #[error("store call timed out")]
    Timeout,
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn not_found(collection: &str, key: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Position of the last row of a previous page: its ordering value and key.
#[derive(Debug, Clone, PartialEq)]
pub struct StartAfter {
    pub value: Value,
    pub key: String,
}

/// Ordered, limited scan over one collection.
///
/// Rows are ordered by `(order_by, key)` in `direction`; rows lacking the
/// `order_by` field are not returned.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub order_by: String,
    pub direction: SortDirection,
    pub limit: u32,
    pub start_after: Option<StartAfter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub body: Document,
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Create or overwrite the document at `key`.
    async fn set(&self, collection: &str, key: &str, document: Document) -> Result<(), StoreError>;

    /// Merge top-level `fields` into an existing document; fails with
    /// [`StoreError::NotFound`] when `key` is absent.
    async fn update(&self, collection: &str, key: &str, fields: Document)
    -> Result<(), StoreError>;

    /// Remove the document at `key`. Removing an absent key succeeds.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    async fn query(
        &self,
        collection: &str,
        query: &CollectionQuery,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Sum of the integer `field` across the collection, ignoring rows where it
    /// is absent or not an integer.
    async fn aggregate_sum(&self, collection: &str, field: &str) -> Result<i64, StoreError>;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::invalid_document(format!(
            "expected an object, got `{other}`"
        ))),
        Err(err) => Err(StoreError::invalid_document(err.to_string())),
    }
}

pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|err| StoreError::invalid_document(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::posts::PostCounter;

    #[test]
    fn documents_must_be_objects() {
        let err = to_document(&42).expect_err("scalars are not documents");
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
    }

    #[test]
    fn malformed_documents_report_invalid_document() {
        let mut document = Document::new();
        document.insert("readCount".into(), Value::String("many".into()));

        let err = from_document::<PostCounter>(document).expect_err("type mismatch");
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
    }
}
