//! Boundary mapping between loosely typed documents and domain entities.
//!
//! Every document read from the store is decoded into a strict shape here;
//! a document that does not conform is reported as an integrity violation
//! instead of leaking partial data into the workflow.

use document_store::{Collection, Document, store::to_body};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// Decodes a stored document into its typed shape.
pub(crate) fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T, DomainError> {
    serde_json::from_value(doc.to_value()).map_err(|e| {
        DomainError::IntegrityViolation(format!(
            "malformed {} document {}: {e}",
            doc.collection, doc.key
        ))
    })
}

/// Encodes a typed shape into a document body.
pub(crate) fn encode<T: Serialize>(
    collection: Collection,
    value: &T,
) -> Result<Map<String, Value>, DomainError> {
    Ok(to_body(collection, value)?)
}
