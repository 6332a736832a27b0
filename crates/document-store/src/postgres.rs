use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Collection, Document, DocumentKey, Result, StoreError, Version,
    store::{DocumentStore, UpdateOptions},
};

const SELECT_COLUMNS: &str = "collection, key, version, data, created_at, updated_at";

/// PostgreSQL-backed document store implementation.
///
/// Documents are rows of a single `documents` table with a JSONB body.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        let collection_name: String = row.try_get("collection")?;
        let collection =
            Collection::parse(&collection_name).ok_or_else(|| StoreError::InvalidDocument {
                collection: Collection::Products,
                reason: format!("unknown collection '{collection_name}'"),
            })?;

        let data = match row.try_get::<Value, _>("data")? {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::InvalidDocument {
                    collection,
                    reason: "stored body is not an object".to_string(),
                });
            }
        };

        Ok(Document {
            collection,
            key: DocumentKey::new(row.try_get::<String, _>("key")?),
            version: Version::new(row.try_get("version")?),
            data,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn current_version(
        &self,
        collection: Collection,
        key: &DocumentKey,
    ) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE collection = $1 AND key = $2")
                .bind(collection.as_str())
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(version.map(Version::new))
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: Collection, key: &DocumentKey) -> Result<Document> {
        metrics::counter!("store_operations_total", "operation" => "get").increment(1);

        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM documents WHERE collection = $1 AND key = $2"
        ))
        .bind(collection.as_str())
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_document(row),
            None => Err(StoreError::NotFound {
                collection,
                key: key.clone(),
            }),
        }
    }

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        metrics::counter!("store_operations_total", "operation" => "query").increment(1);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM documents
            WHERE collection = $1 AND data @> jsonb_build_object($2::text, $3::jsonb)
            ORDER BY created_at ASC, key ASC
            "#
        ))
        .bind(collection.as_str())
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        metrics::counter!("store_operations_total", "operation" => "list").increment(1);

        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM documents WHERE collection = $1 ORDER BY created_at ASC, key ASC"
        ))
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn create(
        &self,
        collection: Collection,
        data: Map<String, Value>,
    ) -> Result<DocumentKey> {
        metrics::counter!("store_operations_total", "operation" => "create").increment(1);

        let key = DocumentKey::generate();
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, version, data)
            VALUES ($1, $2, 1, $3)
            "#,
        )
        .bind(collection.as_str())
        .bind(key.as_str())
        .bind(Value::Object(data))
        .execute(&self.pool)
        .await?;

        Ok(key)
    }

    async fn insert(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version> {
        metrics::counter!("store_operations_total", "operation" => "insert").increment(1);

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO documents (collection, key, version, data)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (collection, key) DO NOTHING
            RETURNING version
            "#,
        )
        .bind(collection.as_str())
        .bind(key.as_str())
        .bind(Value::Object(data))
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(version) => Ok(Version::new(version)),
            None => Err(StoreError::AlreadyExists {
                collection,
                key: key.clone(),
            }),
        }
    }

    async fn put(
        &self,
        collection: Collection,
        key: &DocumentKey,
        data: Map<String, Value>,
    ) -> Result<Version> {
        metrics::counter!("store_operations_total", "operation" => "put").increment(1);

        let version: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO documents (collection, key, version, data)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (collection, key) DO UPDATE
            SET data = EXCLUDED.data,
                version = documents.version + 1,
                updated_at = NOW()
            RETURNING version
            "#,
        )
        .bind(collection.as_str())
        .bind(key.as_str())
        .bind(Value::Object(data))
        .fetch_one(&self.pool)
        .await?;

        Ok(Version::new(version))
    }

    async fn update(
        &self,
        collection: Collection,
        key: &DocumentKey,
        partial: Map<String, Value>,
        options: UpdateOptions,
    ) -> Result<Version> {
        metrics::counter!("store_operations_total", "operation" => "update").increment(1);

        // `data || partial` is a shallow merge of top-level keys. The version
        // predicate is skipped when $4 is NULL.
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE documents
            SET data = data || $3,
                version = version + 1,
                updated_at = NOW()
            WHERE collection = $1 AND key = $2
              AND ($4::BIGINT IS NULL OR version = $4)
            RETURNING version
            "#,
        )
        .bind(collection.as_str())
        .bind(key.as_str())
        .bind(Value::Object(partial))
        .bind(options.expected_version.map(|v| v.as_i64()))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = updated {
            return Ok(Version::new(version));
        }

        // Nothing matched: either the document is gone or the version moved.
        match (self.current_version(collection, key).await?, options.expected_version) {
            (Some(actual), Some(expected)) => Err(StoreError::VersionConflict {
                collection,
                key: key.clone(),
                expected,
                actual,
            }),
            _ => Err(StoreError::NotFound {
                collection,
                key: key.clone(),
            }),
        }
    }

    async fn delete(&self, collection: Collection, key: &DocumentKey) -> Result<()> {
        metrics::counter!("store_operations_total", "operation" => "delete").increment(1);

        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection.as_str())
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection,
                key: key.clone(),
            });
        }
        Ok(())
    }
}
