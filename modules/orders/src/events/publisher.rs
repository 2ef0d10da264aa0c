//! Publishes `order.created` events to the durable bus
//!
//! Publishing is decoupled from the local commit: the caller decides what a
//! publish failure means. Success here means the broker has durably stored
//! the message, nothing more.

use event_bus::{BusError, EventBus};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::events::order_created::{order_created_event, ORDER_CREATED_ROUTING_KEY};
use crate::models::Order;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to publish event: {0}")]
    Bus(#[from] BusError),
}

/// Bus-backed publisher for order events. Holds an injected bus handle; no
/// global connection state.
#[derive(Clone)]
pub struct OrderEventPublisher {
    bus: Arc<dyn EventBus>,
}

impl OrderEventPublisher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Build one `order.created` envelope for the order and publish it
    /// persistently, stamping the message with its event id as a broker-side
    /// dedup hint. Returns the event id the consumer will deduplicate on.
    pub async fn publish(&self, order: &Order) -> Result<Uuid, PublishError> {
        let event = order_created_event(order);
        let payload = serde_json::to_vec(&event)?;

        self.bus
            .publish_with_id(
                ORDER_CREATED_ROUTING_KEY,
                &event.event_id.to_string(),
                payload,
            )
            .await?;

        tracing::info!(
            order_id = order.id,
            event_id = %event.event_id,
            subject = ORDER_CREATED_ROUTING_KEY,
            "Published order.created event"
        );

        Ok(event.event_id)
    }
}
