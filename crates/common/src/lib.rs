//! Identifier types shared by every storefront crate.

mod types;

pub use types::{CustomerId, DocumentKey, OrderId, ProductId};
