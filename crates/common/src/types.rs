use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a string-backed identifier newtype.
///
/// Identifiers in the storefront come from outside the workflow (the identity
/// provider, the catalog, the document store), so they are opaque strings
/// rather than UUIDs.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a customer, issued by the external identity provider.
    CustomerId
);

string_id!(
    /// Identifier of a catalog product.
    ProductId
);

string_id!(
    /// Key of a document within one collection of the document store.
    DocumentKey
);

string_id!(
    /// Identifier of a placed order.
    ///
    /// Orders are keyed by the document store, so this is the order document's key.
    OrderId
);

impl DocumentKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl From<DocumentKey> for OrderId {
    fn from(key: DocumentKey) -> Self {
        Self(key.0)
    }
}

impl From<OrderId> for DocumentKey {
    fn from(id: OrderId) -> Self {
        Self(id.0)
    }
}

impl From<&OrderId> for DocumentKey {
    fn from(id: &OrderId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&ProductId> for DocumentKey {
    fn from(id: &ProductId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&CustomerId> for DocumentKey {
    fn from(id: &CustomerId) -> Self {
        Self(id.0.clone())
    }
}
