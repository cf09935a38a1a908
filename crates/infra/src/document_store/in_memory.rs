use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value as JsonValue};

use super::r#trait::{DocumentStore, SortDirection, StoreError};

/// In-memory keyed document store.
///
/// Intended for tests/dev. Not optimized for performance. The failure switch
/// makes the next operation fail once, for exercising degraded paths.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, JsonValue>>>,
    fail_next: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store operation fail with a backend error.
    pub fn fail_next_operation(&self) {
        self.fail_next.store(true, AtomicOrdering::SeqCst);
    }

    fn take_injected_failure(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, AtomicOrdering::SeqCst) {
            Err(StoreError::backend("injected failure"))
        } else {
            Ok(())
        }
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

/// Ordering over JSON field values: timestamps by instant, strings
/// case-insensitively, numbers numerically. Incomparable values tie.
fn compare_field(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::String(x), JsonValue::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.to_lowercase().cmp(&y.to_lowercase()),
            }
        }
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>, StoreError> {
        self.take_injected_failure()?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        self.take_injected_failure()?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> Result<(), StoreError> {
        self.take_injected_failure()?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::MissingDocument {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        match doc {
            JsonValue::Object(existing) => {
                for (key, value) in fields {
                    existing.insert(key, value);
                }
                Ok(())
            }
            _ => Err(StoreError::backend("document is not an object")),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.take_injected_failure()?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<Vec<JsonValue>, StoreError> {
        self.take_injected_failure()?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let mut docs: Vec<JsonValue> = collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| {
            let missing = JsonValue::Null;
            let ord = compare_field(
                a.get(order_by).unwrap_or(&missing),
                b.get(order_by).unwrap_or(&missing),
            );
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        Ok(docs)
    }
}
