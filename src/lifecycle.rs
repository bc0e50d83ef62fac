//! Order lifecycle rules.
//!
//! Statuses advance along a fixed chain (pending, preparing, shipped,
//! delivered) with cancellation as a side exit from pending only. The
//! display mapping here drives the customer-facing tracker; the store uses
//! the transition predicates to reject illegal updates before they reach
//! the remote database.

use crate::model::OrderStatus;

/// The four tracker stages in display order. Cancelled sits outside the
/// timeline and renders as its own notice.
pub const TIMELINE: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Preparing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

/// Label, icon name, and tracker message for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDisplay {
    pub label: &'static str,
    /// Icon identifier consumed by the front end (lucide names).
    pub icon: &'static str,
    pub message: &'static str,
}

impl OrderStatus {
    /// The next status along the forward-advance chain, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Delivered and cancelled orders never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Cancellation (by customer or admin) is only allowed while pending.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Whether moving from `self` to `to` is a legal transition: one step
    /// forward along the chain, or pending to cancelled.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if to == OrderStatus::Cancelled {
            return self.can_cancel();
        }
        self.next() == Some(to)
    }

    /// Position on the 4-stage tracker timeline. Cancelled has no position.
    pub fn timeline_index(&self) -> Option<usize> {
        TIMELINE.iter().position(|s| s == self)
    }

    pub fn display(&self) -> StatusDisplay {
        match self {
            OrderStatus::Pending => StatusDisplay {
                label: "Order received",
                icon: "clock",
                message: "We have your order and will start on it shortly",
            },
            OrderStatus::Preparing => StatusDisplay {
                label: "Being prepared",
                icon: "package",
                message: "Your food is on the grill right now",
            },
            OrderStatus::Shipped => StatusDisplay {
                label: "On the way",
                icon: "truck",
                message: "The driver is heading to you, have your payment ready",
            },
            OrderStatus::Delivered => StatusDisplay {
                label: "Delivered",
                icon: "home",
                message: "Delivered. Enjoy your meal",
            },
            OrderStatus::Cancelled => StatusDisplay {
                label: "Cancelled",
                icon: "x-circle",
                message: "This order was cancelled. You can place a new one from the menu",
            },
        }
    }

    /// Admin button text for advancing an order out of this status, if an
    /// advance exists.
    pub fn advance_action_label(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Pending => Some("Start preparing"),
            OrderStatus::Preparing => Some("Send for delivery"),
            OrderStatus::Shipped => Some("Mark delivered"),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }
}

/// Customer-facing short reference: the last 6 characters of the order id,
/// prefixed with `#`. Stable for the life of the order.
pub fn short_reference(order_id: &str) -> String {
    let tail: String = order_id
        .chars()
        .rev()
        .take(6)
        .collect::<Vec<char>>()
        .into_iter()
        .rev()
        .collect();
    format!("#{tail}")
}

// ===========================================================================
// Tests
// ===========================================================================
