//! Domain error types.

use document_store::StoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::money::ValueError;
use crate::order::OrderError;

/// Classification of every workflow failure, for callers that only need to
/// decide how to react (show a message, retry, report a bug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The entity is absent.
    NotFound,
    /// A state-machine precondition was violated.
    InvalidTransition,
    /// Stored data breaks an invariant (duplicate carts, malformed documents).
    IntegrityViolation,
    /// The backend failed transiently; retrying may succeed.
    PersistenceUnavailable,
    /// The request itself was malformed.
    ValidationError,
    /// Another writer changed the entity first; reload and retry.
    ConcurrentModification,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidTransition => "InvalidTransition",
            ErrorKind::IntegrityViolation => "IntegrityViolation",
            ErrorKind::PersistenceUnavailable => "PersistenceUnavailable",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::ConcurrentModification => "ConcurrentModification",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error raised by the cart aggregate.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// An error raised by the order workflow.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A value object rejected its input.
    #[error("Invalid value: {0}")]
    Value(#[from] ValueError),

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Request failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored data breaks an invariant.
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// A conditional write lost against a concurrent writer.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// The document store failed transiently.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(#[source] StoreError),
}

impl DomainError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Cart(err) => err.kind(),
            DomainError::Order(err) => err.kind(),
            DomainError::Value(_) | DomainError::Validation(_) => ErrorKind::ValidationError,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::IntegrityViolation(_) => ErrorKind::IntegrityViolation,
            DomainError::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            DomainError::PersistenceUnavailable(_) => ErrorKind::PersistenceUnavailable,
        }
    }

    /// Returns true if the caller may retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::PersistenceUnavailable | ErrorKind::ConcurrentModification
        )
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, key } => DomainError::NotFound {
                entity: collection.as_str(),
                id: key.to_string(),
            },
            StoreError::VersionConflict { .. } | StoreError::AlreadyExists { .. } => {
                DomainError::ConcurrentModification(err.to_string())
            }
            StoreError::InvalidDocument { .. } | StoreError::Serialization(_) => {
                DomainError::IntegrityViolation(err.to_string())
            }
            StoreError::Unavailable(_)
            | StoreError::Timeout(_)
            | StoreError::Database(_)
            | StoreError::Migration(_) => DomainError::PersistenceUnavailable(err),
        }
    }
}
