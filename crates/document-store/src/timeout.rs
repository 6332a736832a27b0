use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    Collection, Document, DocumentKey, Result, StoreError, Version,
    store::{DocumentStore, UpdateOptions},
};

/// Default bound on a single document store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds every call of the wrapped store with a timeout.
///
/// A call that does not finish in time fails with `StoreError::Timeout`,
/// which callers treat as retryable.
#[derive(Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: DocumentStore> TimeoutStore<S> {
    /// Wraps `inner` with the default timeout.
    pub fn new(inner: S) -> Self {
        Self::with_timeout(inner, DEFAULT_TIMEOUT)
    }

    /// Wraps `inner` with a custom timeout.
    pub fn with_timeout(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("store_timeouts_total", "operation" => operation).increment(1);
                tracing::warn!(operation, timeout = ?self.timeout, "document store call timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimeoutStore<S> {
    async fn get(&self, collection: Collection, key: &DocumentKey) -> Result<Document> {
        self.bounded("get", self.inner.get(collection, key)).await
    }

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        self.bounded("query", self.inner.query_by_field(collection, field, value))
            .await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        self.bounded("list", self.inner.list(collection)).await
    }

    async fn create(
        &self,
        collection: Collection,
        data: Map<String, Value>,
    ) -> Result<DocumentKey> {
        self.bounded("create", self.inner.create(collection, data))
            .await
    }

    async fn insert(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version> {
        self.bounded("insert", self.inner.insert(collection, key, data))
            .await
    }

    async fn put(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version> {
        self.bounded("put", self.inner.put(collection, key, data))
            .await
    }

    async fn update(
        &self,
        collection: Collection,
        key: &DocumentKey,
        partial: Map<String, Value>,
        options: UpdateOptions,
    ) -> Result<Version> {
        self.bounded(
            "update",
            self.inner.update(collection, key, partial, options),
        )
        .await
    }

    async fn delete(&self, collection: Collection, key: &DocumentKey) -> Result<()> {
        self.bounded("delete", self.inner.delete(collection, key))
            .await
    }
}
