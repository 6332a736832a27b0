//! Order workflow: checkout, status transitions and their presentation.

mod aggregate;
mod presentation;
mod service;
mod status;

pub use aggregate::{Order, StatusPatch};
pub use presentation::{
    StatusColor, StatusIcon, TimelineStep, status_color, status_icon, timeline,
};
pub use service::OrderService;
pub use status::{OrderStatus, PaymentStatus, RefundStatus};

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order is not in a state that allows the action.
    #[error(
        "Invalid transition: cannot {action} (order {order_status}, payment {payment_status}, refund {refund})"
    )]
    InvalidTransition {
        action: &'static str,
        order_status: OrderStatus,
        payment_status: PaymentStatus,
        refund: RefundStatus,
    },
}

impl OrderError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }
}
