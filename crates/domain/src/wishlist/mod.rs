//! Wishlist store: a keyed set of product snapshots per customer.

use chrono::{DateTime, Utc};
use common::{CustomerId, DocumentKey, ProductId};
use document_store::{Collection, Document, DocumentStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Product;
use crate::document::{decode, encode};
use crate::error::DomainError;

/// A product saved by a customer.
///
/// Entries carry a copy of the product as it was when saved, so the list can
/// be rendered (ratings included) without reading the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Key of the wishlist document.
    #[serde(skip)]
    pub key: DocumentKey,

    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub product_details: Product,
    pub added_at: DateTime<Utc>,
}

impl WishlistEntry {
    fn from_document(doc: &Document) -> Result<Self, DomainError> {
        let mut entry: WishlistEntry = decode(doc)?;
        entry.key = doc.key.clone();
        entry.product_details.id = entry.product_id.clone();
        Ok(entry)
    }
}

/// Per-customer wishlist over the `wishlist` collection.
///
/// At most one entry exists per (customer, product) pair.
#[derive(Clone)]
pub struct WishlistStore<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> WishlistStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Saves a product. Returns the existing entry if it is already saved.
    #[tracing::instrument(skip(self, product), fields(customer_id = %customer_id, product_id = %product.id))]
    pub async fn add(
        &self,
        customer_id: &CustomerId,
        product: &Product,
    ) -> Result<WishlistEntry, DomainError> {
        if customer_id.is_blank() {
            return Err(DomainError::Validation("customer id is required".to_string()));
        }
        if let Some(existing) = self.find(customer_id, &product.id).await? {
            tracing::debug!("Product already in wishlist");
            return Ok(existing);
        }

        let mut entry = WishlistEntry {
            key: DocumentKey::default(),
            customer_id: customer_id.clone(),
            product_id: product.id.clone(),
            product_details: product.clone(),
            added_at: Utc::now(),
        };
        let body = encode(Collection::Wishlist, &entry)?;
        entry.key = self.store.create(Collection::Wishlist, body).await?;

        tracing::info!(entry = %entry.key, "Product added to wishlist");
        Ok(entry)
    }

    /// Removes a saved product. Returns false if it was not saved.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id, product_id = %product_id))]
    pub async fn remove(
        &self,
        customer_id: &CustomerId,
        product_id: &ProductId,
    ) -> Result<bool, DomainError> {
        let Some(entry) = self.find(customer_id, product_id).await? else {
            return Ok(false);
        };

        self.store.delete(Collection::Wishlist, &entry.key).await?;
        tracing::info!(entry = %entry.key, "Product removed from wishlist");
        Ok(true)
    }

    /// Lists the customer's saved products, oldest first.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list(&self, customer_id: &CustomerId) -> Result<Vec<WishlistEntry>, DomainError> {
        let docs = self
            .store
            .query_by_field(
                Collection::Wishlist,
                "customerId",
                &Value::String(customer_id.to_string()),
            )
            .await?;
        docs.iter().map(WishlistEntry::from_document).collect()
    }

    async fn find(
        &self,
        customer_id: &CustomerId,
        product_id: &ProductId,
    ) -> Result<Option<WishlistEntry>, DomainError> {
        Ok(self
            .list(customer_id)
            .await?
            .into_iter()
            .find(|entry| &entry.product_id == product_id))
    }
}
