//! The `order.created` event contract
//!
//! Wire format (all keys required):
//!
//! ```json
//! {
//!   "event_type": "order.created",
//!   "event_id": "<uuid-v4>",
//!   "timestamp": "<ISO-8601>",
//!   "payload": {
//!     "order_id": 1, "customer_id": 1, "product_name": "Widget",
//!     "quantity": 2, "price": 149.99, "status": "pending",
//!     "total_amount": 299.98, "created_at": "<ISO-8601>"
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use event_bus::EventEnvelope;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus};

pub const ORDER_CREATED_EVENT_TYPE: &str = "order.created";

/// Durable stream holding all order events
pub const ORDERS_STREAM: &str = "ORDERS_EVENTS";

/// Routing key the event is published under
pub const ORDER_CREATED_ROUTING_KEY: &str = "orders.created";

/// Payload of the `order.created` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedPayload {
    pub order_id: i64,
    pub customer_id: i64,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Build the `order.created` envelope for a persisted order.
///
/// Called exactly once per publication: the envelope's event_id is the
/// deduplication key downstream, so a retried publish must reuse the same
/// envelope rather than rebuilding it.
pub fn order_created_event(order: &Order) -> EventEnvelope<OrderCreatedPayload> {
    EventEnvelope::new(
        ORDER_CREATED_EVENT_TYPE,
        OrderCreatedPayload {
            order_id: order.id,
            customer_id: order.customer_id,
            product_name: order.product_name.clone(),
            quantity: order.quantity,
            price: order.price.round_dp(2),
            status: order.status,
            total_amount: order.total_amount(),
            created_at: order.created_at,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order() -> Order {
        Order {
            id: 42,
            customer_id: 1,
            product_name: "Widget".to_string(),
            quantity: 2,
            price: "149.99".parse().unwrap(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_type_and_total() {
        let event = order_created_event(&test_order());

        assert_eq!(event.event_type, ORDER_CREATED_EVENT_TYPE);
        assert_eq!(event.payload.order_id, 42);
        assert_eq!(
            event.payload.total_amount,
            "299.98".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_each_build_gets_a_fresh_event_id() {
        let order = test_order();
        let first = order_created_event(&order);
        let second = order_created_event(&order);

        assert_ne!(first.event_id, second.event_id);
    }

    #[test]
    fn test_wire_format() {
        let event = order_created_event(&test_order());
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value.get("event_type").unwrap(), "order.created");
        assert!(event_bus::validate_envelope_fields(&value).is_ok());

        let payload = value.get("payload").unwrap();
        assert_eq!(payload.get("customer_id").unwrap(), 1);
        assert_eq!(payload.get("status").unwrap(), "pending");
        // Money fields go over the wire as JSON numbers
        assert!(payload.get("price").unwrap().is_number());
        assert!((payload.get("total_amount").unwrap().as_f64().unwrap() - 299.98).abs() < 1e-9);
    }
}
