use std::time::Duration;

use thiserror::Error;

use crate::{Collection, DocumentKey, Version};

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document exists under the key.
    #[error("Document not found: {collection}/{key}")]
    NotFound {
        collection: Collection,
        key: DocumentKey,
    },

    /// A create-if-absent write found a document already under the key.
    #[error("Document already exists: {collection}/{key}")]
    AlreadyExists {
        collection: Collection,
        key: DocumentKey,
    },

    /// A conditional update found a different version than expected.
    #[error(
        "Version conflict for {collection}/{key}: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        collection: Collection,
        key: DocumentKey,
        expected: Version,
        actual: Version,
    },

    /// A document body was not a JSON object.
    #[error("Invalid document body for {collection}: {reason}")]
    InvalidDocument {
        collection: Collection,
        reason: String,
    },

    /// The backend could not be reached or refused the request.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured timeout.
    #[error("Document store call timed out after {0:?}")]
    Timeout(Duration),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Timeout(_) | StoreError::Database(_)
        )
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
