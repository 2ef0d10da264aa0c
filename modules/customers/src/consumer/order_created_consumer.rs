//! order.created consumer
//!
//! Pulls deliveries from the durable `customer_service_order_created` queue
//! and applies them to the customer store. The per-message decision —
//! parse, type filter, dedup, transactional apply — lives in
//! [`handle_message`], a function from message bytes to an ack/reject
//! disposition, so it is testable without a broker.
//!
//! A small fixed worker pool drains a bounded channel fed by the
//! subscription; the channel capacity matches the prefetch limit, keeping
//! in-flight messages bounded per process. Two workers touching the same
//! customer serialize on that customer's row lock inside the apply
//! transaction, not here.

use event_bus::{Delivery, Disposition, EventBus};
use futures::StreamExt;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::services::order_counter_service::{process_order_created, ApplyError};

/// Durable stream the order service publishes into
pub const ORDERS_STREAM: &str = "ORDERS_EVENTS";

/// Routing key this consumer's queue is bound to
pub const ORDER_CREATED_SUBJECT: &str = "orders.created";

/// Durable queue / consumer-group name
pub const ORDER_CREATED_QUEUE: &str = "customer_service_order_created";

const WORKER_COUNT: usize = 2;
const PREFETCH_LIMIT: usize = 10;

/// Start the order.created consumer task
///
/// Spawns a background task that binds the durable queue, fans deliveries
/// out to the worker pool, and settles every delivery exactly once after
/// its handler decides.
pub async fn start_order_created_consumer(bus: Arc<dyn EventBus>, pool: PgPool) {
    tokio::spawn(async move {
        tracing::info!("Starting order.created consumer");

        let mut deliveries = match bus
            .subscribe_durable(
                ORDERS_STREAM,
                ORDER_CREATED_QUEUE,
                ORDER_CREATED_SUBJECT,
                PREFETCH_LIMIT,
            )
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(
                    queue = ORDER_CREATED_QUEUE,
                    error = %e,
                    "Failed to bind durable queue"
                );
                return;
            }
        };

        tracing::info!(
            queue = ORDER_CREATED_QUEUE,
            subject = ORDER_CREATED_SUBJECT,
            prefetch = PREFETCH_LIMIT,
            workers = WORKER_COUNT,
            "Subscribed"
        );

        let (tx, rx) = mpsc::channel::<Delivery>(PREFETCH_LIMIT);
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..WORKER_COUNT {
            let rx = rx.clone();
            let pool = pool.clone();

            tokio::spawn(async move {
                loop {
                    let delivery = { rx.lock().await.recv().await };
                    let Some(delivery) = delivery else { break };

                    let disposition = handle_message(&pool, &delivery.message.payload).await;
                    if let Err(e) = delivery.settle(disposition).await {
                        tracing::error!(worker, error = %e, "Failed to settle delivery");
                    }
                }
            });
        }

        while let Some(delivery) = deliveries.next().await {
            if tx.send(delivery).await.is_err() {
                break;
            }
        }

        tracing::warn!("order.created consumer stopped");
    });
}

/// Fields this consumer needs from a well-formed order.created event
#[derive(Debug, PartialEq, Eq)]
pub struct OrderCreatedMessage {
    pub event_id: Uuid,
    pub customer_id: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to parse event: {0}")]
    Json(String),

    #[error("Missing or invalid {0}")]
    MissingField(&'static str),

    #[error("Unexpected event_type: {0}")]
    WrongEventType(String),
}

/// Extract the dedup key and target customer from raw event bytes.
///
/// The type filter is defensive: a queue bound only to orders.created should
/// not see other types, but an unexpected one is rejected the same way as a
/// structurally invalid event.
pub fn parse_order_created(raw: &[u8]) -> Result<OrderCreatedMessage, ParseError> {
    let event: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| ParseError::Json(e.to_string()))?;

    let event_type = event
        .get("event_type")
        .and_then(|v| v.as_str())
        .ok_or(ParseError::MissingField("event_type"))?;

    if event_type != "order.created" {
        return Err(ParseError::WrongEventType(event_type.to_string()));
    }

    let event_id = event
        .get("event_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(ParseError::MissingField("event_id"))?;

    let customer_id = event
        .pointer("/payload/customer_id")
        .and_then(|v| v.as_i64())
        .ok_or(ParseError::MissingField("payload.customer_id"))?;

    Ok(OrderCreatedMessage {
        event_id,
        customer_id,
    })
}

/// Decide the fate of one delivery: Ack or terminal Reject.
///
/// No error escapes this function; every failure mode maps to a
/// disposition and a log line.
pub async fn handle_message(pool: &PgPool, raw: &[u8]) -> Disposition {
    let message = match parse_order_created(raw) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(
                error = %e,
                raw = %String::from_utf8_lossy(raw),
                "Invalid order.created event"
            );
            return Disposition::Reject;
        }
    };

    match process_order_created(pool, message.event_id, message.customer_id).await {
        Ok(()) => Disposition::Ack,
        Err(ApplyError::DuplicateEvent(event_id)) => {
            tracing::info!(event_id = %event_id, "Skipping duplicate event");
            Disposition::Ack
        }
        Err(ApplyError::CustomerNotFound(customer_id)) => {
            tracing::error!(
                event_id = %message.event_id,
                customer_id,
                "Customer not found, rejecting event"
            );
            Disposition::Reject
        }
        Err(ApplyError::Database(e)) => {
            tracing::error!(
                event_id = %message.event_id,
                error = %e,
                "Failed to apply event, rejecting"
            );
            Disposition::Reject
        }
    }
}
