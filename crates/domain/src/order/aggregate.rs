//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use document_store::{Document, Version};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartError, CartLineItem};
use crate::document::decode;
use crate::error::DomainError;
use crate::money::Money;

use super::{OrderError, OrderStatus, PaymentStatus, RefundStatus};

/// Stored shape of an order document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderDocument {
    pub customer_id: CustomerId,
    pub product_details: Vec<CartLineItem>,
    pub total_amount: Money,
    pub order_placed_at: DateTime<Utc>,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub refund: RefundStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderDocument {
    /// Snapshots a cart into a new order document.
    pub fn from_cart(cart: &Cart, placed_at: DateTime<Utc>) -> Result<Self, CartError> {
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        Ok(Self {
            customer_id: cart.customer_id().clone(),
            product_details: cart.items().to_vec(),
            total_amount: cart.total(),
            order_placed_at: placed_at,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::NotRequested,
            refund: RefundStatus::None,
            updated_at: None,
        })
    }
}

/// The only fields an order write may touch.
///
/// Line items and the total are frozen at checkout, so they are not part of
/// this type at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub refund: RefundStatus,
    pub updated_at: DateTime<Utc>,
}

/// A placed order.
///
/// Orders are created only by checkout. Afterwards only the three statuses
/// change, through the transition methods below.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    version: Version,
    customer_id: CustomerId,
    product_details: Vec<CartLineItem>,
    total_amount: Money,
    order_placed_at: DateTime<Utc>,
    order_status: OrderStatus,
    payment_status: PaymentStatus,
    refund: RefundStatus,
    updated_at: Option<DateTime<Utc>>,
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Stored version, used for conditional writes.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the customer who placed the order.
    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Line items copied from the cart at checkout.
    pub fn product_details(&self) -> &[CartLineItem] {
        &self.product_details
    }

    /// Total computed at checkout.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Checkout time.
    pub fn order_placed_at(&self) -> DateTime<Utc> {
        self.order_placed_at
    }

    /// Fulfilment status.
    pub fn order_status(&self) -> OrderStatus {
        self.order_status
    }

    /// Payment status, independent of the fulfilment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Refund status; only moves after a paid order is cancelled.
    pub fn refund(&self) -> RefundStatus {
        self.refund
    }

    /// Time of the last status change, if any.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Total number of units ordered.
    pub fn item_count(&self) -> u64 {
        self.product_details
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.order_status.is_terminal()
    }
}

// Command methods (return the status patch to persist, `None` for a no-op)
impl Order {
    /// Cancels the order.
    ///
    /// Cancelling an already cancelled order is a no-op. If the payment had
    /// succeeded a refund is requested.
    pub fn request_cancellation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusPatch>, OrderError> {
        if self.order_status == OrderStatus::Cancelled {
            return Ok(None);
        }
        if !self.order_status.can_cancel() {
            return Err(self.invalid("cancel"));
        }

        let refund = if self.payment_status == PaymentStatus::Succeeded {
            RefundStatus::Requested
        } else {
            self.refund
        };
        Ok(Some(StatusPatch {
            order_status: OrderStatus::Cancelled,
            refund,
            ..self.patch(now)
        }))
    }

    /// Records that the customer submitted payment, pending admin approval.
    ///
    /// Allowed exactly once, and never on a cancelled order.
    pub fn record_payment_attempt(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusPatch>, OrderError> {
        if self.order_status == OrderStatus::Cancelled
            || self.payment_status != PaymentStatus::NotRequested
        {
            return Err(self.invalid("record payment attempt"));
        }

        Ok(Some(StatusPatch {
            payment_status: PaymentStatus::AwaitingApproval,
            ..self.patch(now)
        }))
    }

    /// Records the administrator's decision on a submitted payment.
    pub fn record_payment_outcome(
        &self,
        succeeded: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusPatch>, OrderError> {
        if self.order_status == OrderStatus::Cancelled
            || self.payment_status != PaymentStatus::AwaitingApproval
        {
            return Err(self.invalid("record payment outcome"));
        }

        let payment_status = if succeeded {
            PaymentStatus::Succeeded
        } else {
            PaymentStatus::Failed
        };
        Ok(Some(StatusPatch {
            payment_status,
            ..self.patch(now)
        }))
    }

    /// Moves the order one step along the happy path.
    ///
    /// `target` must be the immediate successor of the current status.
    pub fn advance_status(
        &self,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<StatusPatch>, OrderError> {
        if self.order_status.next() != Some(target) {
            return Err(self.invalid(match target {
                OrderStatus::Pending => "move to Pending",
                OrderStatus::Received => "move to Received",
                OrderStatus::Dispatched => "move to Dispatched",
                OrderStatus::Delivered => "move to Delivered",
                OrderStatus::Cancelled => "move to Cancelled",
            }));
        }

        Ok(Some(StatusPatch {
            order_status: target,
            ..self.patch(now)
        }))
    }

    /// Marks a requested refund as paid out.
    pub fn complete_refund(&self, now: DateTime<Utc>) -> Result<Option<StatusPatch>, OrderError> {
        if self.refund != RefundStatus::Requested {
            return Err(self.invalid("complete refund"));
        }

        Ok(Some(StatusPatch {
            refund: RefundStatus::Complete,
            ..self.patch(now)
        }))
    }

    /// Returns the order after `patch` was written at `version`.
    pub fn apply(&self, patch: StatusPatch, version: Version) -> Order {
        Order {
            version,
            order_status: patch.order_status,
            payment_status: patch.payment_status,
            refund: patch.refund,
            updated_at: Some(patch.updated_at),
            ..self.clone()
        }
    }

    fn patch(&self, now: DateTime<Utc>) -> StatusPatch {
        StatusPatch {
            order_status: self.order_status,
            payment_status: self.payment_status,
            refund: self.refund,
            updated_at: now,
        }
    }

    fn invalid(&self, action: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            action,
            order_status: self.order_status,
            payment_status: self.payment_status,
            refund: self.refund,
        }
    }
}

// Document boundary
impl Order {
    pub(crate) fn from_parts(id: OrderId, version: Version, stored: OrderDocument) -> Self {
        Self {
            id,
            version,
            customer_id: stored.customer_id,
            product_details: stored.product_details,
            total_amount: stored.total_amount,
            order_placed_at: stored.order_placed_at,
            order_status: stored.order_status,
            payment_status: stored.payment_status,
            refund: stored.refund,
            updated_at: stored.updated_at,
        }
    }

    /// Decodes an order document. Orders without line items cannot have been
    /// produced by checkout and are rejected.
    pub(crate) fn from_document(doc: &Document) -> Result<Self, DomainError> {
        let stored: OrderDocument = decode(doc)?;
        if stored.product_details.is_empty() {
            return Err(DomainError::IntegrityViolation(format!(
                "order {} has no line items",
                doc.key
            )));
        }
        Ok(Self::from_parts(
            OrderId::from(doc.key.clone()),
            doc.version,
            stored,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::error::ErrorKind;
    use crate::money::Discount;
    use common::DocumentKey;
    use document_store::Collection;
    use serde_json::{Value, json};

    fn order(status: OrderStatus, payment: PaymentStatus, refund: RefundStatus) -> Order {
        let product = Product::new(
            "prod-a",
            "Vase",
            Money::from_major(1000),
            Discount::percent_of(10).unwrap(),
        );
        let item = CartLineItem::snapshot(&product, 3).unwrap();
        Order::from_parts(
            OrderId::new("order-1"),
            Version::first(),
            OrderDocument {
                customer_id: CustomerId::new("cust-1"),
                total_amount: Money::from_major(2700),
                product_details: vec![item],
                order_placed_at: Utc::now(),
                order_status: status,
                payment_status: payment,
                refund,
                updated_at: None,
            },
        )
    }

    fn pending() -> Order {
        order(
            OrderStatus::Pending,
            PaymentStatus::NotRequested,
            RefundStatus::None,
        )
    }

    #[test]
    fn test_cancel_pending_order() {
        let order = pending();
        let patch = order.request_cancellation(Utc::now()).unwrap().unwrap();
        assert_eq!(patch.order_status, OrderStatus::Cancelled);
        assert_eq!(patch.refund, RefundStatus::None);
    }

    #[test]
    fn test_cancel_paid_order_requests_refund() {
        let order = order(
            OrderStatus::Pending,
            PaymentStatus::Succeeded,
            RefundStatus::None,
        );
        let patch = order.request_cancellation(Utc::now()).unwrap().unwrap();
        let cancelled = order.apply(patch, Version::new(2));
        assert_eq!(cancelled.order_status(), OrderStatus::Cancelled);
        assert_eq!(cancelled.refund(), RefundStatus::Requested);

        let patch = cancelled.complete_refund(Utc::now()).unwrap().unwrap();
        assert_eq!(patch.refund, RefundStatus::Complete);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let order = order(
            OrderStatus::Cancelled,
            PaymentStatus::NotRequested,
            RefundStatus::None,
        );
        assert_eq!(order.request_cancellation(Utc::now()).unwrap(), None);
    }

    #[test]
    fn test_cannot_cancel_delivered_order() {
        let order = order(
            OrderStatus::Delivered,
            PaymentStatus::Succeeded,
            RefundStatus::None,
        );
        let err = order.request_cancellation(Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert!(err.to_string().contains("cancel"));
        assert!(err.to_string().contains("Delivered"));
    }

    #[test]
    fn test_payment_attempt_happens_once() {
        let order = pending();
        let patch = order.record_payment_attempt(Utc::now()).unwrap().unwrap();
        assert_eq!(patch.payment_status, PaymentStatus::AwaitingApproval);

        let awaiting = order.apply(patch, Version::new(2));
        assert!(awaiting.record_payment_attempt(Utc::now()).is_err());
    }

    #[test]
    fn test_payment_attempt_rejected_on_cancelled_order() {
        let order = order(
            OrderStatus::Cancelled,
            PaymentStatus::NotRequested,
            RefundStatus::None,
        );
        assert!(order.record_payment_attempt(Utc::now()).is_err());
    }

    #[test]
    fn test_payment_outcome_requires_attempt() {
        assert!(pending().record_payment_outcome(true, Utc::now()).is_err());

        let awaiting = order(
            OrderStatus::Received,
            PaymentStatus::AwaitingApproval,
            RefundStatus::None,
        );
        let patch = awaiting
            .record_payment_outcome(false, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(patch.payment_status, PaymentStatus::Failed);
        assert_eq!(patch.order_status, OrderStatus::Received);
    }

    #[test]
    fn test_advance_only_to_immediate_successor() {
        let order = pending();
        assert!(order.advance_status(OrderStatus::Dispatched, Utc::now()).is_err());
        assert!(order.advance_status(OrderStatus::Cancelled, Utc::now()).is_err());

        let patch = order
            .advance_status(OrderStatus::Received, Utc::now())
            .unwrap()
            .unwrap();
        let received = order.apply(patch, Version::new(2));
        assert!(
            received
                .advance_status(OrderStatus::Pending, Utc::now())
                .is_err()
        );
    }

    #[test]
    fn test_complete_refund_requires_request() {
        assert!(pending().complete_refund(Utc::now()).is_err());
    }

    #[test]
    fn test_transitions_never_touch_items_or_total() {
        let order = order(
            OrderStatus::Pending,
            PaymentStatus::Succeeded,
            RefundStatus::None,
        );
        let patch = order.request_cancellation(Utc::now()).unwrap().unwrap();
        let cancelled = order.apply(patch, Version::new(2));
        assert_eq!(cancelled.total_amount(), order.total_amount());
        assert_eq!(cancelled.product_details(), order.product_details());
        assert_eq!(cancelled.order_placed_at(), order.order_placed_at());
    }

    #[test]
    fn test_item_count_does_not_overflow_u32() {
        let mut order = pending();
        let mut line = order.product_details[0].clone();
        line.quantity = u32::MAX;
        order.product_details = vec![line.clone(), line];
        assert_eq!(order.item_count(), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_status_patch_serializes_only_status_fields() {
        let patch = pending().request_cancellation(Utc::now()).unwrap().unwrap();
        let value = serde_json::to_value(patch).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["orderStatus", "paymentStatus", "refund", "updatedAt"]
        );
    }

    #[test]
    fn test_from_document_reads_legacy_labels() {
        let map = match json!({
            "customerId": "cust-1",
            "productDetails": [
                {"productId": "a", "name": "A", "image": "", "price": 1000, "discount": 10, "quantity": 1}
            ],
            "totalAmount": "900.00",
            "orderPlaced": true,
            "orderPlacedAt": "2024-11-02T10:15:00Z",
            "orderDelivered": false,
            "paymentStatus": "Pending",
            "orderStatus": "Pending"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let doc = Document::new(Collection::Orders, DocumentKey::new("o-legacy"), map);

        let order = Order::from_document(&doc).unwrap();
        assert_eq!(order.id().as_str(), "o-legacy");
        assert_eq!(order.payment_status(), PaymentStatus::NotRequested);
        assert_eq!(order.refund(), RefundStatus::None);
        assert_eq!(order.total_amount().to_string(), "₹900.00");
    }

    #[test]
    fn test_from_document_rejects_empty_orders() {
        let map = match json!({
            "customerId": "cust-1",
            "productDetails": [],
            "totalAmount": 0,
            "orderPlacedAt": "2024-11-02T10:15:00Z"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let doc = Document::new(Collection::Orders, DocumentKey::new("o-empty"), map);
        let err = Order::from_document(&doc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }
}
