use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::money::{Discount, Money};

use super::CartError;

/// One product entry in a cart, carrying its own price snapshot.
///
/// Orders copy these by value at checkout, so the same shape is stored under
/// an order's `productDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// The product this line refers to. The cart does not own the product.
    pub product_id: ProductId,

    pub name: String,

    /// Cover image at the time the product was added.
    #[serde(default)]
    pub image: String,

    /// Unit price snapshot.
    pub price: Money,

    /// Discount snapshot.
    #[serde(default)]
    pub discount: Discount,

    pub quantity: u32,
}

impl CartLineItem {
    /// Snapshots a product's name, cover image, price and discount.
    pub fn snapshot(product: &Product, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity: 0 });
        }

        Ok(Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image: product.cover_image().unwrap_or_default().to_string(),
            price: product.price,
            discount: product.discount,
            quantity,
        })
    }

    /// Unit price after the snapshotted discount.
    pub fn discounted_price(&self) -> Money {
        self.price.discounted(self.discount)
    }

    /// Discounted unit price times quantity, unrounded.
    pub fn line_total(&self) -> Money {
        self.discounted_price().multiply(self.quantity)
    }
}
