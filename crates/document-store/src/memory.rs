use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::{
    Collection, Document, DocumentKey, Result, StoreError, Version,
    store::{DocumentStore, UpdateOptions},
};

/// Simulated backend failures, used by tests to exercise error paths.
#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    failing_writes: HashSet<Collection>,
}

/// In-memory document store implementation for testing and local runs.
///
/// Provides the same interface and version semantics as the PostgreSQL
/// implementation. Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
    faults: Arc<RwLock<Faults>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn document_count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    /// Clears all documents.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.faults.write().await.unavailable = unavailable;
    }

    /// Makes writes (create/put/update/delete) to one collection fail with
    /// `Unavailable` until reset. Reads keep working.
    pub async fn set_fail_writes(&self, collection: Collection, fail: bool) {
        let mut faults = self.faults.write().await;
        if fail {
            faults.failing_writes.insert(collection);
        } else {
            faults.failing_writes.remove(&collection);
        }
    }

    async fn check_read(&self) -> Result<()> {
        if self.faults.read().await.unavailable {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }

    async fn check_write(&self, collection: Collection) -> Result<()> {
        let faults = self.faults.read().await;
        if faults.unavailable {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        if faults.failing_writes.contains(&collection) {
            return Err(StoreError::Unavailable(format!(
                "writes to {collection} are failing"
            )));
        }
        Ok(())
    }
}

fn not_found(collection: Collection, key: &DocumentKey) -> StoreError {
    StoreError::NotFound {
        collection,
        key: key.clone(),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: Collection, key: &DocumentKey) -> Result<Document> {
        self.check_read().await?;
        metrics::counter!("store_operations_total", "operation" => "get").increment(1);

        let collections = self.collections.read().await;
        collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| &d.key == key))
            .cloned()
            .ok_or_else(|| not_found(collection, key))
    }

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        self.check_read().await?;
        metrics::counter!("store_operations_total", "operation" => "query").increment(1);

        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.field_equals(field, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        self.check_read().await?;
        metrics::counter!("store_operations_total", "operation" => "list").increment(1);

        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn create(
        &self,
        collection: Collection,
        data: Map<String, Value>,
    ) -> Result<DocumentKey> {
        self.check_write(collection).await?;
        metrics::counter!("store_operations_total", "operation" => "create").increment(1);

        let key = DocumentKey::generate();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .push(Document::new(collection, key.clone(), data));
        Ok(key)
    }

    async fn insert(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version> {
        self.check_write(collection).await?;
        metrics::counter!("store_operations_total", "operation" => "insert").increment(1);

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| &d.key == key) {
            return Err(StoreError::AlreadyExists {
                collection,
                key: key.clone(),
            });
        }
        docs.push(Document::new(collection, key.clone(), data));
        Ok(Version::first())
    }

    async fn put(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version> {
        self.check_write(collection).await?;
        metrics::counter!("store_operations_total", "operation" => "put").increment(1);

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        match docs.iter_mut().find(|d| &d.key == key) {
            Some(existing) => {
                existing.data = data;
                existing.version = existing.version.next();
                existing.updated_at = chrono::Utc::now();
                Ok(existing.version)
            }
            None => {
                docs.push(Document::new(collection, key.clone(), data));
                Ok(Version::first())
            }
        }
    }

    async fn update(
        &self,
        collection: Collection,
        key: &DocumentKey,
        partial: Map<String, Value>,
        options: UpdateOptions,
    ) -> Result<Version> {
        self.check_write(collection).await?;
        metrics::counter!("store_operations_total", "operation" => "update").increment(1);

        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| &d.key == key))
            .ok_or_else(|| not_found(collection, key))?;

        if let Some(expected) = options.expected_version
            && doc.version != expected
        {
            return Err(StoreError::VersionConflict {
                collection,
                key: key.clone(),
                expected,
                actual: doc.version,
            });
        }

        doc.merge(partial);
        Ok(doc.version)
    }

    async fn delete(&self, collection: Collection, key: &DocumentKey) -> Result<()> {
        self.check_write(collection).await?;
        metrics::counter!("store_operations_total", "operation" => "delete").increment(1);

        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(&collection)
            .ok_or_else(|| not_found(collection, key))?;
        let position = docs
            .iter()
            .position(|d| &d.key == key)
            .ok_or_else(|| not_found(collection, key))?;
        docs.remove(position);
        Ok(())
    }
}
