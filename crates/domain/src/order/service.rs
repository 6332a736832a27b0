//! Order service: checkout and status transitions.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{CustomerId, DocumentKey, OrderId};
use document_store::{Collection, DocumentStore, UpdateOptions, Version};
use serde_json::Value;

use crate::cart::CartService;
use crate::document::encode;
use crate::error::DomainError;

use super::aggregate::OrderDocument;
use super::{Order, OrderError, OrderStatus, StatusPatch};

/// Service for placing and progressing orders.
///
/// Checkout spans two writes (create the order, clear the cart). The store
/// offers no transaction across them, so a failed cart clear is compensated
/// by deleting the order again.
#[derive(Clone)]
pub struct OrderService<S: DocumentStore> {
    store: S,
    carts: CartService<S>,
}

impl<S: DocumentStore + Clone> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            store,
        }
    }

    /// Converts the customer's cart into an order and empties the cart.
    ///
    /// On success the order exists and the cart has no line items. On failure
    /// neither has changed, unless compensation itself failed, which is
    /// reported as an integrity violation naming the orphaned order.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn place_order(&self, customer_id: &CustomerId) -> Result<Order, DomainError> {
        let started = Instant::now();

        let cart = self.carts.get_cart(customer_id).await?;
        let stored = OrderDocument::from_cart(&cart, Utc::now())?;
        let body = encode(Collection::Orders, &stored)?;
        let key = self.store.create(Collection::Orders, body).await?;
        let order_id = OrderId::from(key.clone());

        if let Err(err) = self.carts.clear_loaded(&cart).await {
            metrics::counter!("order_compensations_total").increment(1);
            tracing::warn!(
                order_id = %order_id,
                error = %err,
                "Cart clear failed after order creation, removing order"
            );

            if let Err(compensation) = self.store.delete(Collection::Orders, &key).await {
                tracing::error!(
                    order_id = %order_id,
                    error = %compensation,
                    "Failed to remove order after cart clear failure"
                );
                return Err(DomainError::IntegrityViolation(format!(
                    "order {order_id} was created but the cart could not be cleared \
                     ({err}) and the order could not be removed ({compensation})"
                )));
            }
            return Err(err);
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order_id,
            total = %stored.total_amount,
            items = stored.product_details.len(),
            "Order placed"
        );

        Ok(Order::from_parts(order_id, Version::first(), stored))
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &OrderId) -> Result<Order, DomainError> {
        let doc = self
            .store
            .get(Collection::Orders, &DocumentKey::from(order_id))
            .await?;
        Order::from_document(&doc)
    }

    /// Lists the customer's orders, newest first.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_orders(&self, customer_id: &CustomerId) -> Result<Vec<Order>, DomainError> {
        let docs = self
            .store
            .query_by_field(
                Collection::Orders,
                "customerId",
                &Value::String(customer_id.to_string()),
            )
            .await?;

        let mut orders = docs
            .iter()
            .map(Order::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by(|a, b| b.order_placed_at().cmp(&a.order_placed_at()));
        Ok(orders)
    }

    /// Cancels an order. Cancelling a cancelled order succeeds without a write.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn request_cancellation(&self, order_id: &OrderId) -> Result<Order, DomainError> {
        self.transition(order_id, "cancel", |order, now| {
            order.request_cancellation(now)
        })
        .await
    }

    /// Records that the customer submitted payment.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn record_payment_attempt(&self, order_id: &OrderId) -> Result<Order, DomainError> {
        self.transition(order_id, "payment_attempt", |order, now| {
            order.record_payment_attempt(now)
        })
        .await
    }

    /// Records the administrator's decision on a submitted payment.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn record_payment_outcome(
        &self,
        order_id: &OrderId,
        succeeded: bool,
    ) -> Result<Order, DomainError> {
        self.transition(order_id, "payment_outcome", move |order, now| {
            order.record_payment_outcome(succeeded, now)
        })
        .await
    }

    /// Moves the order to the next fulfilment status.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn advance_status(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<Order, DomainError> {
        self.transition(order_id, "advance_status", move |order, now| {
            order.advance_status(target, now)
        })
        .await
    }

    /// Marks a requested refund as complete.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn complete_refund(&self, order_id: &OrderId) -> Result<Order, DomainError> {
        self.transition(order_id, "complete_refund", |order, now| {
            order.complete_refund(now)
        })
        .await
    }

    /// Loads the order, lets `decide` compute the status patch, and writes it
    /// conditionally on the loaded version.
    async fn transition<F>(
        &self,
        order_id: &OrderId,
        name: &'static str,
        decide: F,
    ) -> Result<Order, DomainError>
    where
        F: FnOnce(&Order, DateTime<Utc>) -> Result<Option<StatusPatch>, OrderError> + Send,
    {
        let order = self.get_order(order_id).await?;
        let Some(patch) = decide(&order, Utc::now())? else {
            tracing::debug!(transition = name, "Transition is a no-op");
            return Ok(order);
        };

        let body = encode(Collection::Orders, &patch)?;
        let version = self
            .store
            .update(
                Collection::Orders,
                &DocumentKey::from(order_id),
                body,
                UpdateOptions::expect_version(order.version()),
            )
            .await?;

        metrics::counter!("order_transitions_total", "transition" => name).increment(1);
        tracing::info!(
            transition = name,
            order_status = %patch.order_status,
            payment_status = %patch.payment_status,
            refund = %patch.refund,
            "Order updated"
        );
        Ok(order.apply(patch, version))
    }
}
