//! Order, payment and refund state machines.
//!
//! The three statuses move independently and are kept as separate types.
//! In particular the order's `Pending` and the payment's initial state are
//! unrelated, so the payment side uses its own names.

use serde::{Deserialize, Serialize};

/// Fulfilment status of an order.
///
/// State transitions:
/// ```text
/// Pending ──► Received ──► Dispatched ──► Delivered
///    │           │             │
///    └───────────┴─────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed, not yet acknowledged.
    #[default]
    Pending,

    /// Acknowledged by the store.
    Received,

    /// Handed to the courier.
    Dispatched,

    /// Delivered to the customer (terminal state).
    Delivered,

    /// Cancelled by the customer (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// The linear happy path, in order.
    pub const TIMELINE: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Received,
        OrderStatus::Dispatched,
        OrderStatus::Delivered,
    ];

    /// Position on the happy path; `None` for `Cancelled`.
    pub fn sequence_index(&self) -> Option<usize> {
        Self::TIMELINE.iter().position(|s| s == self)
    }

    /// The immediate successor on the happy path.
    pub fn next(&self) -> Option<OrderStatus> {
        self.sequence_index()
            .and_then(|i| Self::TIMELINE.get(i + 1))
            .copied()
    }

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Received => "Received",
            OrderStatus::Dispatched => "Dispatched",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status of an order.
///
/// ```text
/// NotRequested ──► AwaitingApproval ──┬──► Succeeded
///                                     └──► Failed
/// ```
///
/// Documents written with the older `"Pending"` and `"Success"` labels are
/// read as `NotRequested` and `Succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// No payment attempt has been made.
    #[default]
    #[serde(alias = "Pending")]
    NotRequested,

    /// The customer submitted payment; an administrator has to confirm it.
    AwaitingApproval,

    #[serde(alias = "Success")]
    Succeeded,

    Failed,
}

impl PaymentStatus {
    /// Returns true once an outcome has been recorded.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::NotRequested => "NotRequested",
            PaymentStatus::AwaitingApproval => "AwaitingApproval",
            PaymentStatus::Succeeded => "Succeeded",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Refund status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    #[default]
    None,
    Requested,
    Complete,
}

impl RefundStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::None => "none",
            RefundStatus::Requested => "requested",
            RefundStatus::Complete => "complete",
        }
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
