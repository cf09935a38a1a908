use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use clubdesk_core::DomainError;

/// Error raised by a document store backend.
///
/// The core treats every variant as transient: reads degrade to an empty or
/// stale view plus a notification, writes leave in-memory state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend failure: {0}")]
    Backend(String),

    /// A partial update targeted a document that does not exist.
    #[error("no document '{id}' in collection '{collection}'")]
    MissingDocument { collection: String, id: String },
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            // A vanished target is the domain's NotFound, not a backend
            // fault.
            StoreError::MissingDocument { .. } => DomainError::NotFound,
            StoreError::Backend(msg) => DomainError::StoreFailure(msg),
        }
    }
}

/// Query ordering direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reverse(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Keyed JSON document collections.
///
/// Documents are `serde_json` values at this boundary; typed record structs
/// live above it. All operations are asynchronous and may fail with a
/// `StoreError`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document, `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>, StoreError>;

    /// Create or replace one document.
    async fn set(&self, collection: &str, id: &str, document: JsonValue)
        -> Result<(), StoreError>;

    /// Merge `fields` into an existing document. Fails with
    /// `MissingDocument` if it does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, JsonValue>,
    ) -> Result<(), StoreError>;

    /// Delete one document. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// All documents of a collection, ordered by `order_by`.
    async fn query(
        &self,
        collection: &str,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<Vec<JsonValue>, StoreError>;
}
