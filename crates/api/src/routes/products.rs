//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use document_store::DocumentStore;
use domain::{Discount, Money, Product, ProductId, Review};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// Admin payload for creating or replacing a product.
#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub discount: Discount,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "available")]
    pub availability: bool,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub dimensions: String,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

fn available() -> bool {
    true
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price: String,
    pub discount_percent: Decimal,
    pub discounted_price: String,
    pub images: Vec<String>,
    pub category: String,
    pub availability: bool,
    pub medium: String,
    pub dimensions: String,
    pub average_rating: f64,
    pub review_count: usize,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: money(product.price),
            discount_percent: product.discount.percent(),
            discounted_price: money(product.price.discounted(product.discount)),
            images: product.images.clone(),
            category: product.category.clone(),
            availability: product.availability,
            medium: product.medium.clone(),
            dimensions: product.dimensions.clone(),
            average_rating: product.average_rating(),
            review_count: product.reviews.len(),
        }
    }
}

/// GET /products: list the catalog, optionally filtered by `?category=`.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let products = state.catalog.list_products(category).await?;
    Ok(Json(products.iter().map(ProductResponse::from).collect()))
}

/// GET /products/{product_id}: load one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .get_product(&ProductId::new(product_id))
        .await?;
    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /products/{product_id}: create or replace a product.
#[tracing::instrument(skip(state, req))]
pub async fn put<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = Product::new(product_id, req.name, req.price, req.discount)
        .with_images(req.images)
        .with_category(req.category)
        .with_availability(req.availability)
        .with_reviews(req.reviews);
    let product = Product {
        medium: req.medium,
        dimensions: req.dimensions,
        ..product
    };

    state.catalog.put_product(&product).await?;
    Ok(Json(ProductResponse::from(&product)))
}
