//! Cart aggregate implementation.

use common::{CustomerId, DocumentKey, ProductId};
use document_store::{Document, Version};
use serde::{Deserialize, Serialize};

use crate::document::decode;
use crate::error::DomainError;
use crate::money::Money;

use super::{CartError, CartLineItem};

/// Sum of discounted line totals, unrounded.
pub fn cart_total(items: &[CartLineItem]) -> Money {
    items.iter().map(CartLineItem::line_total).sum()
}

/// Stored shape of a cart document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartDocument {
    pub customer_id: CustomerId,

    /// Customer display name, recorded when the cart was created.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub product_details: Vec<CartLineItem>,

    /// Denormalised total for readers of the raw document. Never trusted on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Money>,
}

/// Fields rewritten by every cart mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartItemsPatch<'a> {
    pub product_details: &'a [CartLineItem],
    pub total_amount: Money,
}

impl<'a> CartItemsPatch<'a> {
    pub fn new(items: &'a [CartLineItem]) -> Self {
        Self {
            product_details: items,
            total_amount: cart_total(items),
        }
    }
}

/// A customer's cart.
///
/// At most one cart exists per customer. The total is always derived from the
/// line items. Command methods never mutate the cart: they return the line
/// items the cart should hold next, and the service swaps them in only after
/// the write has been accepted by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    key: DocumentKey,
    customer_id: CustomerId,
    customer_name: String,
    items: Vec<CartLineItem>,
    version: Version,
}

// Query methods
impl Cart {
    /// Key of the cart document.
    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Returns the owning customer.
    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Customer display name recorded on the cart.
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Returns the line items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Stored version, used for conditional writes.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns true if the cart has no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Σ discounted price × quantity over every line.
    pub fn total(&self) -> Money {
        cart_total(&self.items)
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Returns true if any line carries the product.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }
}

// Command methods (return the next line items)
impl Cart {
    /// Appends a line. Repeated adds of one product produce separate lines.
    pub fn add_item(&self, item: CartLineItem) -> Vec<CartLineItem> {
        let mut items = self.items.clone();
        items.push(item);
        items
    }

    /// Applies `delta` to every line carrying the product.
    ///
    /// Quantities are clamped at zero, and a line reaching zero is removed.
    /// Removal must be confirmed by the caller.
    pub fn change_quantity(
        &self,
        product_id: &ProductId,
        delta: i64,
        confirm_removal: bool,
    ) -> Result<Vec<CartLineItem>, CartError> {
        if delta == 0 {
            return Err(CartError::InvalidDelta);
        }
        if !self.contains(product_id) {
            return Err(CartError::ItemNotFound {
                product_id: product_id.to_string(),
            });
        }

        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if &item.product_id != product_id {
                items.push(item.clone());
                continue;
            }

            let quantity = i64::from(item.quantity).saturating_add(delta).max(0);
            if quantity == 0 {
                if !confirm_removal {
                    return Err(CartError::RemovalNotConfirmed {
                        product_id: product_id.to_string(),
                    });
                }
                continue;
            }

            let quantity =
                u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity { quantity })?;
            items.push(CartLineItem {
                quantity,
                ..item.clone()
            });
        }
        Ok(items)
    }

    /// Removes every line carrying the product.
    pub fn remove_item(&self, product_id: &ProductId) -> Result<Vec<CartLineItem>, CartError> {
        if !self.contains(product_id) {
            return Err(CartError::ItemNotFound {
                product_id: product_id.to_string(),
            });
        }

        Ok(self
            .items
            .iter()
            .filter(|item| &item.product_id != product_id)
            .cloned()
            .collect())
    }

    /// Returns the cart after `items` were written at `version`.
    pub fn with_items(&self, items: Vec<CartLineItem>, version: Version) -> Cart {
        Cart {
            items,
            version,
            ..self.clone()
        }
    }
}

// Document boundary
impl Cart {
    /// Creates the in-memory view of a freshly created cart document.
    pub(crate) fn created(
        key: DocumentKey,
        customer_id: CustomerId,
        customer_name: String,
        items: Vec<CartLineItem>,
        version: Version,
    ) -> Self {
        Self {
            key,
            customer_id,
            customer_name,
            items,
            version,
        }
    }

    /// Decodes a cart document, rejecting lines persisted at quantity zero.
    pub(crate) fn from_document(doc: &Document) -> Result<Self, DomainError> {
        let stored: CartDocument = decode(doc)?;

        if let Some(item) = stored.product_details.iter().find(|i| i.quantity == 0) {
            return Err(DomainError::IntegrityViolation(format!(
                "cart {} holds {} at quantity 0",
                doc.key, item.product_id
            )));
        }

        let cart = Self {
            key: doc.key.clone(),
            customer_id: stored.customer_id,
            customer_name: stored.name,
            items: stored.product_details,
            version: doc.version,
        };

        if let Some(stored_total) = stored.total_amount
            && stored_total.round_for_display() != cart.total().round_for_display()
        {
            tracing::warn!(
                cart = %doc.key,
                stored = %stored_total,
                recomputed = %cart.total(),
                "Stored cart total drifted from line items, using recomputed total"
            );
        }

        Ok(cart)
    }

    /// Body of a new cart document.
    pub(crate) fn new_document(
        customer_id: &CustomerId,
        customer_name: &str,
        items: &[CartLineItem],
    ) -> CartDocument {
        CartDocument {
            customer_id: customer_id.clone(),
            name: customer_name.to_string(),
            product_details: items.to_vec(),
            total_amount: Some(cart_total(items)),
        }
    }
}
