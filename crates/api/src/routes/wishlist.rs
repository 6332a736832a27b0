//! Wishlist endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use domain::{CustomerId, ProductId, WishlistEntry};
use serde::{Deserialize, Serialize};

use super::products::ProductResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: String,
}

#[derive(Serialize)]
pub struct WishlistEntryResponse {
    pub product: ProductResponse,
    pub added_at: DateTime<Utc>,
}

impl From<&WishlistEntry> for WishlistEntryResponse {
    fn from(entry: &WishlistEntry) -> Self {
        Self {
            product: ProductResponse::from(&entry.product_details),
            added_at: entry.added_at,
        }
    }
}

/// GET /customers/{customer_id}/wishlist: list saved products.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<WishlistEntryResponse>>, ApiError> {
    let entries = state.wishlist.list(&CustomerId::new(customer_id)).await?;
    Ok(Json(entries.iter().map(WishlistEntryResponse::from).collect()))
}

/// POST /customers/{customer_id}/wishlist: save a catalog product.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
    Json(req): Json<AddToWishlistRequest>,
) -> Result<Json<WishlistEntryResponse>, ApiError> {
    let product = state
        .catalog
        .get_product(&ProductId::new(req.product_id))
        .await?;
    let entry = state
        .wishlist
        .add(&CustomerId::new(customer_id), &product)
        .await?;
    Ok(Json(WishlistEntryResponse::from(&entry)))
}

/// DELETE /customers/{customer_id}/wishlist/{product_id}: unsave a product.
///
/// Removing a product that is not saved is not an error.
#[tracing::instrument(skip(state))]
pub async fn remove<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((customer_id, product_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .wishlist
        .remove(&CustomerId::new(customer_id), &ProductId::new(product_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
