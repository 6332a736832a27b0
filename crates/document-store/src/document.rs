use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DocumentKey;

/// The collections the storefront persists documents in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Catalog product records, owned by catalog management.
    Products,
    /// Customer profiles.
    Customers,
    /// One cart per customer.
    Cart,
    /// Placed orders.
    Orders,
    /// Wishlist entries, one per (customer, product).
    Wishlist,
}

impl Collection {
    /// Every collection, in a stable order.
    pub const ALL: [Collection; 5] = [
        Collection::Products,
        Collection::Customers,
        Collection::Cart,
        Collection::Orders,
        Collection::Wishlist,
    ];

    /// Returns the collection's storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Customers => "customers",
            Collection::Cart => "cart",
            Collection::Orders => "orders",
            Collection::Wishlist => "wishlist",
        }
    }

    /// Parses a storage name back into a collection.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Version number of a document, used for optimistic concurrency control.
///
/// A document is created at version 1 and every successful write bumps it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a freshly created document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A stored document: a JSON object plus its storage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The collection the document lives in.
    pub collection: Collection,

    /// The document's key within its collection.
    pub key: DocumentKey,

    /// Current version of the document.
    pub version: Version,

    /// The document body.
    pub data: Map<String, Value>,

    /// When the document was first written.
    pub created_at: DateTime<Utc>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a new version-1 document.
    pub fn new(collection: Collection, key: DocumentKey, data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            collection,
            key,
            version: Version::first(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a top-level field of the body.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Returns true if the top-level field equals `value`.
    pub fn field_equals(&self, name: &str, value: &Value) -> bool {
        self.data.get(name) == Some(value)
    }

    /// Shallow-merges `partial` into the body and bumps the version.
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (field, value) in partial {
            self.data.insert(field, value);
        }
        self.version = self.version.next();
        self.updated_at = Utc::now();
    }

    /// Returns the body as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}
