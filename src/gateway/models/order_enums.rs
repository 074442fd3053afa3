//! Order status enumeration and transition table.
//!
//! The status field on an order shows the current state of its lifecycle. An
//! order is created `pending` and moves through the states below; `cancelled`
//! and `returned` are terminal. Every mutation of the status column flows
//! through `OrderStatus::can_transition_to`, which is the single encoding of
//! the allowed-transition table, and every accepted transition appends one
//! immutable row to the order's status history.
//!
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, TimeleError};

/// Represents the lifecycle state of an order.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order has been created and awaits processing.
    #[serde(rename = "pending")]
    Pending,

    /// Order is being picked and packed.
    #[serde(rename = "processing")]
    Processing,

    /// Order has left the warehouse.
    #[serde(rename = "shipped")]
    Shipped,

    /// Order has reached the customer.
    #[serde(rename = "delivered")]
    Delivered,

    /// Order was cancelled before shipment. Terminal.
    #[serde(rename = "cancelled")]
    Cancelled,

    /// Order was sent back after shipment or delivery. Terminal.
    #[serde(rename = "returned")]
    Returned,
}

impl OrderStatus {
    /// Whether this state admits no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// The allowed-transition table:
    ///
    /// ```text
    /// pending    -> processing | cancelled
    /// processing -> shipped    | cancelled
    /// shipped    -> delivered  | returned
    /// delivered  -> returned
    /// cancelled, returned      -- terminal
    /// ```
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Returned)
                | (Delivered, Returned)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // String representation doubles as the stored column value.
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = TimeleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "returned" => Ok(OrderStatus::Returned),
            other => Err(TimeleError::service(
                ErrorKind::InvalidInput,
                format!("unknown order status `{other}`"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ];

    #[test]
    fn test_legal_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Returned));
        assert!(Delivered.can_transition_to(Returned));
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for next in ALL {
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
            assert!(!OrderStatus::Returned.can_transition_to(next));
        }
    }

    #[test]
    fn test_no_self_or_backward_transitions() {
        use OrderStatus::*;
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
        assert!(!Shipped.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Shipped));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn test_round_trip_through_storage_form() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(parsed, OrderStatus::Shipped);
    }
}
