//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p document-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use document_store::{
    Collection, DocumentKey, DocumentStore, DocumentStoreExt, PostgresDocumentStore, StoreError,
    UpdateOptions, Version,
};
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_documents_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and a cleared table
async fn get_test_store() -> PostgresDocumentStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE documents")
        .execute(&pool)
        .await
        .unwrap();

    PostgresDocumentStore::new(pool)
}

fn body(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[tokio::test]
async fn create_and_get_document() {
    let store = get_test_store().await;

    let key = store
        .create(
            Collection::Cart,
            body(json!({"customerId": "c1", "productDetails": []})),
        )
        .await
        .unwrap();

    let doc = store.get(Collection::Cart, &key).await.unwrap();
    assert_eq!(doc.collection, Collection::Cart);
    assert_eq!(doc.version, Version::first());
    assert_eq!(doc.field("customerId"), Some(&json!("c1")));
}

#[tokio::test]
async fn get_missing_document_is_not_found() {
    let store = get_test_store().await;

    let err = store
        .get(Collection::Orders, &DocumentKey::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn query_by_field_matches_json_equality() {
    let store = get_test_store().await;

    store
        .create(Collection::Orders, body(json!({"customerId": "c1"})))
        .await
        .unwrap();
    store
        .create(Collection::Orders, body(json!({"customerId": "c2"})))
        .await
        .unwrap();
    store
        .create(Collection::Wishlist, body(json!({"customerId": "c1"})))
        .await
        .unwrap();

    let docs = store
        .query_by_field(Collection::Orders, "customerId", &json!("c1"))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].collection, Collection::Orders);
}

#[tokio::test]
async fn update_merges_top_level_fields() {
    let store = get_test_store().await;

    let key = store
        .create(
            Collection::Orders,
            body(json!({"orderStatus": "Pending", "totalAmount": "2700"})),
        )
        .await
        .unwrap();

    let version = store
        .update(
            Collection::Orders,
            &key,
            body(json!({"orderStatus": "Cancelled", "refund": "requested"})),
            UpdateOptions::expect_version(Version::first()),
        )
        .await
        .unwrap();
    assert_eq!(version, Version::new(2));

    let doc = store.get(Collection::Orders, &key).await.unwrap();
    assert_eq!(doc.field("orderStatus"), Some(&json!("Cancelled")));
    assert_eq!(doc.field("refund"), Some(&json!("requested")));
    assert_eq!(doc.field("totalAmount"), Some(&json!("2700")));
}

#[tokio::test]
async fn stale_update_is_a_version_conflict() {
    let store = get_test_store().await;

    let key = store
        .create(Collection::Cart, body(json!({"productDetails": []})))
        .await
        .unwrap();
    store
        .update(
            Collection::Cart,
            &key,
            body(json!({"productDetails": ["a"]})),
            UpdateOptions::new(),
        )
        .await
        .unwrap();

    let err = store
        .update(
            Collection::Cart,
            &key,
            body(json!({"productDetails": ["b"]})),
            UpdateOptions::expect_version(Version::first()),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::VersionConflict { actual, .. } if actual == Version::new(2)
    ));
}

#[tokio::test]
async fn update_missing_document_is_not_found() {
    let store = get_test_store().await;

    let err = store
        .update(
            Collection::Cart,
            &DocumentKey::new("gone"),
            body(json!({"x": 1})),
            UpdateOptions::expect_version(Version::first()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn put_upserts_and_bumps_version() {
    let store = get_test_store().await;
    let key = DocumentKey::new("prod-1");

    let v1 = store
        .put(Collection::Products, &key, body(json!({"name": "Vase"})))
        .await
        .unwrap();
    let v2 = store
        .put(Collection::Products, &key, body(json!({"name": "Urn"})))
        .await
        .unwrap();

    assert_eq!(v1, Version::first());
    assert_eq!(v2, Version::new(2));
    let doc = store.get(Collection::Products, &key).await.unwrap();
    assert_eq!(doc.field("name"), Some(&json!("Urn")));
}

#[tokio::test]
async fn insert_refuses_an_existing_key() {
    let store = get_test_store().await;
    let key = DocumentKey::new("c1");

    let version = store
        .insert(Collection::Cart, &key, body(json!({"productDetails": []})))
        .await
        .unwrap();
    assert_eq!(version, Version::first());

    let err = store
        .insert(Collection::Cart, &key, body(json!({"productDetails": [1]})))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));

    let doc = store.get(Collection::Cart, &key).await.unwrap();
    assert_eq!(doc.version, Version::first());
    assert_eq!(doc.field("productDetails"), Some(&json!([])));
}

#[tokio::test]
async fn query_by_field_ignores_other_fields_with_the_same_value() {
    let store = get_test_store().await;

    store
        .create(
            Collection::Products,
            body(json!({"category": "pottery", "medium": "clay"})),
        )
        .await
        .unwrap();
    store
        .create(
            Collection::Products,
            body(json!({"category": "clay", "medium": "pottery"})),
        )
        .await
        .unwrap();

    let docs = store
        .query_by_field(Collection::Products, "category", &json!("pottery"))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].field("medium"), Some(&json!("clay")));
}

#[tokio::test]
async fn delete_removes_document() {
    let store = get_test_store().await;

    let key = store
        .create(Collection::Wishlist, body(json!({"productId": "p1"})))
        .await
        .unwrap();
    store.delete(Collection::Wishlist, &key).await.unwrap();

    assert!(!store.exists(Collection::Wishlist, &key).await.unwrap());
    let err = store.delete(Collection::Wishlist, &key).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn list_returns_collection_in_creation_order() {
    let store = get_test_store().await;

    let first = store
        .create(Collection::Products, body(json!({"n": 1})))
        .await
        .unwrap();
    let second = store
        .create(Collection::Products, body(json!({"n": 2})))
        .await
        .unwrap();

    let keys: Vec<_> = store
        .list(Collection::Products)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.key)
        .collect();
    assert_eq!(keys, vec![first, second]);
}
