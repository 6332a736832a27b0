//! Checkout, order history and order administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use domain::{CustomerId, Order, OrderId, OrderStatus, TimelineStep};
use serde::{Deserialize, Serialize};

use super::cart::LineItemResponse;
use super::money;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PaymentOutcomeRequest {
    pub succeeded: bool,
}

#[derive(Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: OrderStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub items: Vec<LineItemResponse>,
    pub item_count: u64,
    pub total: String,
    pub order_status: &'static str,
    pub payment_status: &'static str,
    pub refund: &'static str,
    pub can_cancel: bool,
    pub order_placed_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            items: order
                .product_details()
                .iter()
                .map(LineItemResponse::from)
                .collect(),
            item_count: order.item_count(),
            total: money(order.total_amount()),
            order_status: order.order_status().as_str(),
            payment_status: order.payment_status().as_str(),
            refund: order.refund().as_str(),
            can_cancel: order.order_status().can_cancel(),
            order_placed_at: order.order_placed_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Serialize)]
pub struct TimelineStepResponse {
    pub status: &'static str,
    pub icon: domain::StatusIcon,
    pub color: &'static str,
    pub hex: &'static str,
}

impl From<&TimelineStep> for TimelineStepResponse {
    fn from(step: &TimelineStep) -> Self {
        Self {
            status: step.status.as_str(),
            icon: step.icon,
            color: step.color.as_str(),
            hex: step.color.hex(),
        }
    }
}

#[derive(Serialize)]
pub struct TimelineResponse {
    pub order_id: String,
    pub order_status: &'static str,
    pub steps: Vec<TimelineStepResponse>,
}

// -- Handlers --

/// POST /customers/{customer_id}/orders: check out the customer's cart.
#[tracing::instrument(skip(state))]
pub async fn place<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .orders
        .place_order(&CustomerId::new(customer_id))
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /customers/{customer_id}/orders: order history, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .orders
        .list_orders(&CustomerId::new(customer_id))
        .await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{order_id}: load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(&OrderId::new(order_id)).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/{order_id}/timeline: status timeline with display affordances.
#[tracing::instrument(skip(state))]
pub async fn timeline<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<TimelineResponse>, ApiError> {
    let order = state.orders.get_order(&OrderId::new(order_id)).await?;
    Ok(Json(TimelineResponse {
        order_id: order.id().to_string(),
        order_status: order.order_status().as_str(),
        steps: domain::timeline(&order)
            .iter()
            .map(TimelineStepResponse::from)
            .collect(),
    }))
}

/// POST /orders/{order_id}/cancel: cancel, requesting a refund if paid.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .request_cancellation(&OrderId::new(order_id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{order_id}/payment: record that the customer submitted payment.
#[tracing::instrument(skip(state))]
pub async fn payment_attempt<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .record_payment_attempt(&OrderId::new(order_id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{order_id}/payment/outcome: approve or reject a submitted payment.
#[tracing::instrument(skip(state, req))]
pub async fn payment_outcome<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
    Json(req): Json<PaymentOutcomeRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .record_payment_outcome(&OrderId::new(order_id), req.succeeded)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{order_id}/status: move the order to its next status.
#[tracing::instrument(skip(state, req))]
pub async fn advance_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
    Json(req): Json<AdvanceStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    if req.status == OrderStatus::Cancelled {
        return Err(ApiError::BadRequest(
            "use the cancel endpoint to cancel an order".to_string(),
        ));
    }
    let order = state
        .orders
        .advance_status(&OrderId::new(order_id), req.status)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{order_id}/refund/complete: mark a requested refund as paid out.
#[tracing::instrument(skip(state))]
pub async fn complete_refund<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .complete_refund(&OrderId::new(order_id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}
