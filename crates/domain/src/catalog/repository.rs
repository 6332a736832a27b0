use common::{DocumentKey, ProductId};
use document_store::{Collection, Document, DocumentStore, Version};
use serde_json::Value;

use crate::document::{decode, encode};
use crate::error::DomainError;

use super::Product;

/// Read access to the `products` collection.
#[derive(Clone)]
pub struct CatalogRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CatalogRepository<S> {
    /// Creates a repository over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads a product by id.
    #[tracing::instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product, DomainError> {
        let doc = self
            .store
            .get(Collection::Products, &DocumentKey::from(product_id))
            .await?;
        product_from_document(&doc)
    }

    /// Lists products, optionally restricted to one category.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, DomainError> {
        let docs = match category {
            Some(category) => {
                self.store
                    .query_by_field(
                        Collection::Products,
                        "category",
                        &Value::String(category.to_string()),
                    )
                    .await?
            }
            None => self.store.list(Collection::Products).await?,
        };
        docs.iter().map(product_from_document).collect()
    }

    /// Writes a product under its id.
    ///
    /// Catalog management lives outside the workflow; this exists for seeding
    /// and administrative tooling.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn put_product(&self, product: &Product) -> Result<Version, DomainError> {
        if product.id.is_blank() {
            return Err(DomainError::Validation("product id is required".to_string()));
        }
        product.validate()?;
        let body = encode(Collection::Products, product)?;
        Ok(self
            .store
            .put(Collection::Products, &DocumentKey::from(&product.id), body)
            .await?)
    }
}

fn product_from_document(doc: &Document) -> Result<Product, DomainError> {
    let mut product: Product = decode(doc)?;
    product.id = ProductId::new(doc.key.as_str());
    product.validate().map_err(|e| {
        DomainError::IntegrityViolation(format!("product {}: {e}", doc.key))
    })?;
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Review;
    use crate::error::ErrorKind;
    use crate::money::{Discount, Money};
    use document_store::InMemoryDocumentStore;
    use serde_json::json;

    fn repo() -> (CatalogRepository<InMemoryDocumentStore>, InMemoryDocumentStore) {
        let store = InMemoryDocumentStore::new();
        (CatalogRepository::new(store.clone()), store)
    }

    #[tokio::test]
    async fn put_and_get_product() {
        let (repo, _) = repo();
        let product = Product::new(
            "prod-1",
            "Vase",
            Money::from_major(1000),
            Discount::percent_of(10).unwrap(),
        )
        .with_category("ceramics")
        .with_reviews(vec![Review::new(4, "nice").unwrap()]);

        repo.put_product(&product).await.unwrap();
        let loaded = repo.get_product(&ProductId::new("prod-1")).await.unwrap();

        assert_eq!(loaded, product);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let (repo, _) = repo();
        let err = repo.get_product(&ProductId::new("nope")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list_by_category() {
        let (repo, _) = repo();
        for (id, category) in [("a", "ceramics"), ("b", "prints"), ("c", "ceramics")] {
            let product = Product::new(id, id, Money::from_major(10), Discount::none())
                .with_category(category);
            repo.put_product(&product).await.unwrap();
        }

        let ceramics = repo.list_products(Some("ceramics")).await.unwrap();
        let ids: Vec<_> = ceramics.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(repo.list_products(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn malformed_product_is_an_integrity_violation() {
        let (repo, store) = repo();
        let body = match json!({"name": "Bad", "price": 10, "discount": 150}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store
            .put(Collection::Products, &DocumentKey::new("bad"), body)
            .await
            .unwrap();

        let err = repo.get_product(&ProductId::new("bad")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }

    #[tokio::test]
    async fn product_without_id_is_rejected() {
        let (repo, _) = repo();
        let product = Product::new("", "Nameless", Money::from_major(1), Discount::none());
        let err = repo.put_product(&product).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }
}
