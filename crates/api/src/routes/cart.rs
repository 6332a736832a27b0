//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use document_store::DocumentStore;
use domain::{Cart, CartLineItem, CustomerId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: Option<u32>,
}

#[derive(Deserialize)]
pub struct ChangeQuantityRequest {
    pub delta: i64,
    #[serde(default)]
    pub confirm_removal: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct LineItemResponse {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub price: String,
    pub discount_percent: Decimal,
    pub discounted_price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartLineItem> for LineItemResponse {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            price: money(item.price),
            discount_percent: item.discount.percent(),
            discounted_price: money(item.discounted_price()),
            quantity: item.quantity,
            line_total: money(item.line_total()),
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub items: Vec<LineItemResponse>,
    pub item_count: u64,
    pub total: String,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.key().to_string(),
            customer_id: cart.customer_id().to_string(),
            customer_name: cart.customer_name().to_string(),
            items: cart.items().iter().map(LineItemResponse::from).collect(),
            item_count: cart.item_count(),
            total: money(cart.total()),
        }
    }
}

// -- Handlers --

/// GET /customers/{customer_id}/cart: load the customer's cart.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_cart(&CustomerId::new(customer_id)).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// POST /customers/{customer_id}/cart/items: add a catalog product.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product = state
        .catalog
        .get_product(&ProductId::new(req.product_id))
        .await?;
    let cart = state
        .carts
        .add_item(
            &CustomerId::new(customer_id),
            &product,
            req.quantity.unwrap_or(1),
        )
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PATCH /customers/{customer_id}/cart/items/{product_id}: change a quantity by `delta`.
#[tracing::instrument(skip(state, req))]
pub async fn change_quantity<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((customer_id, product_id)): Path<(String, String)>,
    Json(req): Json<ChangeQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .change_quantity(
            &CustomerId::new(customer_id),
            &ProductId::new(product_id),
            req.delta,
            req.confirm_removal,
        )
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /customers/{customer_id}/cart/items/{product_id}: remove a product.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((customer_id, product_id)): Path<(String, String)>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .remove_item(&CustomerId::new(customer_id), &ProductId::new(product_id))
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /customers/{customer_id}/cart: empty the cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.clear(&CustomerId::new(customer_id)).await?;
    Ok(Json(CartResponse::from(&cart)))
}
