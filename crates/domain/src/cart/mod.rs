//! Cart aggregate and related types.

mod aggregate;
mod line_item;
mod service;

pub use aggregate::{Cart, cart_total};
pub use line_item::CartLineItem;
pub use service::CartService;

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Line items hold at least one unit.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// A quantity change must move the quantity.
    #[error("Invalid quantity change: delta must not be 0")]
    InvalidDelta,

    /// No line in the cart carries the product.
    #[error("Item not found in cart: {product_id}")]
    ItemNotFound { product_id: String },

    /// The change would remove the line and the caller did not confirm it.
    #[error("Removing {product_id} from the cart requires confirmation")]
    RemovalNotConfirmed { product_id: String },

    /// Checkout needs at least one line item.
    #[error("Cart is empty")]
    EmptyCart,

    /// The product cannot currently be bought.
    #[error("Product is not available: {product_id}")]
    ProductUnavailable { product_id: String },
}

impl CartError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::ItemNotFound { .. } => ErrorKind::NotFound,
            CartError::EmptyCart => ErrorKind::InvalidTransition,
            CartError::InvalidQuantity { .. }
            | CartError::InvalidDelta
            | CartError::RemovalNotConfirmed { .. }
            | CartError::ProductUnavailable { .. } => ErrorKind::ValidationError,
        }
    }
}
