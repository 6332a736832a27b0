//! Persistence port for the storefront workflow.
//!
//! A keyed document store organised in collections. The workflow only needs
//! get/query/create/update/delete, plus a version on every document so cart
//! and order writes can be made conditional.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod timeout;

pub use common::DocumentKey;
pub use document::{Collection, Document, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, DocumentStoreExt, UpdateOptions};
pub use timeout::{DEFAULT_TIMEOUT, TimeoutStore};
