//! Typed fanout payloads
//!
//! One variant per row of the routing table, so every event provably
//! constructs the shape its subscribers expect instead of an untyped map.

use crate::order::{Order, OrderStatus, OrderSummary};
use serde::{Deserialize, Serialize};

/// Payload published to a topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanoutPayload {
    /// Order created - full order including lines
    OrderCreated { order: Order },

    /// Lines edited or order back in preparation - full order including lines
    OrderUpdated { order: Order },

    /// Order plated and waiting to be served
    OrderReady { order: OrderSummary },

    /// Order charged to a room tab; summary carries the room number
    OrderChargedToRoom { order: OrderSummary },

    /// Order settled
    OrderPaid { order: OrderSummary },

    /// Status-only delta for transitions no recipient needs detail for
    OrderStatusChanged {
        order_id: String,
        status: OrderStatus,
    },

    /// Menu item toggled on/off
    MenuItemAvailability {
        item_id: String,
        name: String,
        available: bool,
    },

    /// A recipe component dropped to or below its threshold
    LowStockAlert {
        component_id: String,
        name: String,
        quantity: f64,
        threshold: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_tagged() {
        let payload = FanoutPayload::LowStockAlert {
            component_id: "flour".into(),
            name: "Flour".into(),
            quantity: 2.0,
            threshold: 5.0,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "LOW_STOCK_ALERT");
        assert_eq!(json["component_id"], "flour");
    }

    #[test]
    fn status_delta_round_trips() {
        let payload = FanoutPayload::OrderStatusChanged {
            order_id: "o-1".into(),
            status: OrderStatus::Cancelled,
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: FanoutPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
