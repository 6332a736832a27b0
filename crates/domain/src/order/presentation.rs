//! Display affordances for order status timelines.

use serde::Serialize;

use super::{Order, OrderStatus};

/// Icon shown next to an order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusIcon {
    Clock,
    Package,
    Truck,
    CheckCircle,
    XCircle,
}

/// Colour affordance of one timeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    /// The order has reached this step.
    Reached,
    /// The order has not reached this step yet.
    Upcoming,
    /// The order was cancelled; every step renders this way.
    Cancelled,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Reached => "reached",
            StatusColor::Upcoming => "upcoming",
            StatusColor::Cancelled => "cancelled",
        }
    }

    /// CSS colour for the affordance.
    pub fn hex(&self) -> &'static str {
        match self {
            StatusColor::Reached => "#4ade80",
            StatusColor::Upcoming => "#9ca3af",
            StatusColor::Cancelled => "#f87171",
        }
    }
}

/// Icon for a status.
pub fn status_icon(status: OrderStatus) -> StatusIcon {
    match status {
        OrderStatus::Pending => StatusIcon::Clock,
        OrderStatus::Received => StatusIcon::Package,
        OrderStatus::Dispatched => StatusIcon::Truck,
        OrderStatus::Delivered => StatusIcon::CheckCircle,
        OrderStatus::Cancelled => StatusIcon::XCircle,
    }
}

/// Colour of timeline step `step` for an order currently at `current`.
///
/// A step is reached when its position on the happy path is at or before the
/// current status. A cancelled order renders every step as cancelled.
pub fn status_color(current: OrderStatus, step: OrderStatus) -> StatusColor {
    if current == OrderStatus::Cancelled {
        return StatusColor::Cancelled;
    }
    match (current.sequence_index(), step.sequence_index()) {
        (Some(current), Some(step)) if step <= current => StatusColor::Reached,
        _ => StatusColor::Upcoming,
    }
}

/// One rendered step of an order's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub status: OrderStatus,
    pub icon: StatusIcon,
    pub color: StatusColor,
}

/// The four happy-path steps of an order, with their affordances.
pub fn timeline(order: &Order) -> Vec<TimelineStep> {
    OrderStatus::TIMELINE
        .iter()
        .map(|&status| TimelineStep {
            status,
            icon: status_icon(status),
            color: status_color(order.order_status(), status),
        })
        .collect()
}
