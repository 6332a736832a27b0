//! Cart service: loads, mutates and persists a customer's cart.

use common::{CustomerId, DocumentKey, ProductId};
use document_store::{
    Collection, DocumentStore, DocumentStoreExt, StoreError, UpdateOptions, Version,
};
use serde_json::Value;

use crate::catalog::Product;
use crate::document::encode;
use crate::error::DomainError;

use super::aggregate::CartItemsPatch;
use super::{Cart, CartError, CartLineItem};

/// Service for managing carts.
///
/// Every mutation is persist-then-reflect: the next line items are computed
/// from the loaded cart, written with a version check, and only then returned
/// as the updated cart. A failed write leaves the caller holding the cart it
/// loaded.
#[derive(Clone)]
pub struct CartService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the customer's cart, if one exists.
    ///
    /// More than one cart for a customer is an integrity violation and is
    /// surfaced rather than resolved.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn find_cart(&self, customer_id: &CustomerId) -> Result<Option<Cart>, DomainError> {
        let docs = self
            .store
            .query_by_field(
                Collection::Cart,
                "customerId",
                &Value::String(customer_id.to_string()),
            )
            .await?;

        match docs.as_slice() {
            [] => Ok(None),
            [doc] => Cart::from_document(doc).map(Some),
            _ => {
                tracing::error!(count = docs.len(), "Customer has more than one cart");
                Err(DomainError::IntegrityViolation(format!(
                    "{} carts found for customer {customer_id}",
                    docs.len()
                )))
            }
        }
    }

    /// Loads the customer's cart, failing with `NotFound` if there is none.
    pub async fn get_cart(&self, customer_id: &CustomerId) -> Result<Cart, DomainError> {
        self.find_cart(customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("cart", customer_id))
    }

    /// Adds a product to the customer's cart, creating the cart on first add.
    ///
    /// The cart is stored under the customer's id, so two concurrent first
    /// adds cannot create two carts: the one that loses the create appends
    /// its line to the cart the other created.
    #[tracing::instrument(skip(self, product), fields(customer_id = %customer_id, product_id = %product.id))]
    pub async fn add_item(
        &self,
        customer_id: &CustomerId,
        product: &Product,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        if customer_id.is_blank() {
            return Err(DomainError::Validation("customer id is required".to_string()));
        }
        if !product.availability {
            return Err(CartError::ProductUnavailable {
                product_id: product.id.to_string(),
            }
            .into());
        }
        let item = CartLineItem::snapshot(product, quantity)?;

        let cart = match self.find_cart(customer_id).await? {
            Some(cart) => cart,
            None => {
                if let Some(cart) = self.create_cart(customer_id, vec![item.clone()]).await? {
                    return Ok(cart);
                }
                tracing::debug!("Cart was created concurrently, adding to it");
                self.find_cart(customer_id).await?.ok_or_else(|| {
                    DomainError::ConcurrentModification(format!(
                        "cart for customer {customer_id} was removed while being created"
                    ))
                })?
            }
        };

        let items = cart.add_item(item);
        self.persist(&cart, items, "add_item").await
    }

    /// Applies a quantity delta to the product's lines.
    ///
    /// A change that would bring a line to zero removes it, and fails with
    /// `RemovalNotConfirmed` unless `confirm_removal` is set.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id, product_id = %product_id))]
    pub async fn change_quantity(
        &self,
        customer_id: &CustomerId,
        product_id: &ProductId,
        delta: i64,
        confirm_removal: bool,
    ) -> Result<Cart, DomainError> {
        let cart = self.get_cart(customer_id).await?;
        let items = cart.change_quantity(product_id, delta, confirm_removal)?;
        self.persist(&cart, items, "change_quantity").await
    }

    /// Removes the product's lines from the cart.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        customer_id: &CustomerId,
        product_id: &ProductId,
    ) -> Result<Cart, DomainError> {
        let cart = self.get_cart(customer_id).await?;
        let items = cart.remove_item(product_id)?;
        self.persist(&cart, items, "remove_item").await
    }

    /// Empties the cart, leaving the cart document in place.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn clear(&self, customer_id: &CustomerId) -> Result<Cart, DomainError> {
        let cart = self.get_cart(customer_id).await?;
        self.persist(&cart, Vec::new(), "clear").await
    }

    /// Empties the cart only if it is still at the version it was loaded at.
    pub(crate) async fn clear_loaded(&self, cart: &Cart) -> Result<Cart, DomainError> {
        self.persist(cart, Vec::new(), "clear").await
    }

    /// Creates the cart under the customer's key. Returns `None` if a cart
    /// already exists there.
    async fn create_cart(
        &self,
        customer_id: &CustomerId,
        items: Vec<CartLineItem>,
    ) -> Result<Option<Cart>, DomainError> {
        let customer_name = self.customer_name(customer_id).await?;
        let key = DocumentKey::from(customer_id);
        let body = encode(
            Collection::Cart,
            &Cart::new_document(customer_id, &customer_name, &items),
        )?;

        let version = match self.store.insert(Collection::Cart, &key, body).await {
            Ok(version) => version,
            Err(StoreError::AlreadyExists { .. }) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        metrics::counter!("cart_mutations_total", "operation" => "create").increment(1);
        tracing::info!(cart = %key, "Cart created");

        Ok(Some(Cart::created(
            key,
            customer_id.clone(),
            customer_name,
            items,
            version,
        )))
    }

    async fn persist(
        &self,
        cart: &Cart,
        items: Vec<CartLineItem>,
        operation: &'static str,
    ) -> Result<Cart, DomainError> {
        let patch = encode(Collection::Cart, &CartItemsPatch::new(&items))?;
        let version: Version = self
            .store
            .update(
                Collection::Cart,
                cart.key(),
                patch,
                UpdateOptions::expect_version(cart.version()),
            )
            .await?;

        metrics::counter!("cart_mutations_total", "operation" => operation).increment(1);
        let updated = cart.with_items(items, version);
        tracing::info!(
            cart = %cart.key(),
            operation,
            items = updated.items().len(),
            total = %updated.total(),
            "Cart updated"
        );
        Ok(updated)
    }

    /// Display name from the customer's profile, empty if there is none.
    async fn customer_name(&self, customer_id: &CustomerId) -> Result<String, DomainError> {
        let profile = self
            .store
            .get_optional(Collection::Customers, &DocumentKey::from(customer_id))
            .await?;
        Ok(profile
            .as_ref()
            .and_then(|doc| doc.field("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
