use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{Collection, Document, DocumentKey, Result, StoreError, Version};

/// Options for updating a document.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Expected version of the document for optimistic concurrency control.
    /// If None, no version check is performed (last write wins).
    pub expected_version: Option<Version>,
}

impl UpdateOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }
}

/// Core trait for document store implementations.
///
/// Documents are flat or nested JSON objects addressed by collection and key.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document by key.
    ///
    /// Fails with `NotFound` if no document exists under the key.
    async fn get(&self, collection: Collection, key: &DocumentKey) -> Result<Document>;

    /// Retrieves every document whose top-level `field` equals `value`.
    ///
    /// Documents are returned in creation order (oldest first).
    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>>;

    /// Retrieves every document in a collection, in creation order.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>>;

    /// Creates a document under a store-generated key.
    async fn create(&self, collection: Collection, data: Map<String, Value>)
    -> Result<DocumentKey>;

    /// Creates a document under a caller-chosen key.
    ///
    /// Fails with `AlreadyExists` if a document is already stored under the
    /// key; the existing document is left untouched.
    async fn insert(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version>;

    /// Writes a document under a caller-chosen key, replacing any existing body.
    ///
    /// Returns the version after the write.
    async fn put(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version>;

    /// Shallow-merges `partial` into an existing document.
    ///
    /// Fails with `NotFound` if the document is absent, and with
    /// `VersionConflict` if `options.expected_version` is set and differs
    /// from the stored version. Returns the version after the write.
    async fn update(
        &self,
        collection: Collection,
        key: &DocumentKey,
        partial: Map<String, Value>,
        options: UpdateOptions,
    ) -> Result<Version>;

    /// Deletes a document.
    ///
    /// Fails with `NotFound` if the document is absent.
    async fn delete(&self, collection: Collection, key: &DocumentKey) -> Result<()>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Retrieves a document, mapping `NotFound` to `None`.
    async fn get_optional(
        &self,
        collection: Collection,
        key: &DocumentKey,
    ) -> Result<Option<Document>> {
        match self.get(collection, key).await {
            Ok(doc) => Ok(Some(doc)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Checks if a document exists.
    async fn exists(&self, collection: Collection, key: &DocumentKey) -> Result<bool> {
        Ok(self.get_optional(collection, key).await?.is_some())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Converts a serializable value into a document body.
///
/// Fails with `InvalidDocument` unless the value serializes to a JSON object.
pub fn to_body<T: serde::Serialize>(
    collection: Collection,
    value: &T,
) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument {
            collection,
            reason: format!("expected a JSON object, got {}", json_type(&other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
