//! Order creation orchestration
//!
//! Sequencing: verify the customer exists (hard precondition, remote call
//! with bounded retries) → validate and persist the order → publish the
//! `order.created` event. A publish failure after the local write does not
//! fail the operation: the order already exists and is queryable, so a
//! messaging outage degrades consistency rather than availability. The
//! resulting gap is visible to callers as an absent `event_id`.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::clients::customer_client::{CustomerInfo, CustomerLookup};
use crate::events::publisher::OrderEventPublisher;
use crate::models::{CreateOrderRequest, Order, OrderStatus};
use crate::repos::order_repo;
use crate::validation::validate_create_order;

/// Errors that can occur during order creation
#[derive(Debug, Error)]
pub enum CreateOrderError {
    /// The remote customer could not be verified; its reason is the sole
    /// error reported to the caller.
    #[error("{0}")]
    CustomerLookup(String),

    #[error("Order validation failed")]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateOrderError {
    /// Field-level messages for the API's error-list contract.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::CustomerLookup(reason) => vec![reason.clone()],
            Self::Validation(errors) => errors.clone(),
            Self::Database(e) => vec![format!("Database error: {e}")],
        }
    }
}

/// Result of a successful order creation
#[derive(Debug)]
pub struct CreatedOrder {
    pub order: Order,
    pub customer: CustomerInfo,
    /// Present when the event was durably published
    pub event_id: Option<Uuid>,
}

/// Create an order after verifying its customer against the remote store.
///
/// Precondition or validation failure aborts before any write; once the
/// order row is committed the operation cannot fail anymore, only degrade.
pub async fn create_order(
    pool: &PgPool,
    lookup: &dyn CustomerLookup,
    publisher: &OrderEventPublisher,
    req: CreateOrderRequest,
) -> Result<CreatedOrder, CreateOrderError> {
    let customer = lookup
        .fetch_customer(req.customer_id)
        .await
        .map_err(|e| CreateOrderError::CustomerLookup(e.to_string()))?;

    let errors = validate_create_order(&req);
    if !errors.is_empty() {
        return Err(CreateOrderError::Validation(
            errors.iter().map(ToString::to_string).collect(),
        ));
    }

    // Orders always start pending; a caller-supplied status has already been
    // validated against the enum by deserialization but is not honored here.
    let order = order_repo::insert(
        pool,
        req.customer_id,
        req.product_name.trim(),
        req.quantity,
        req.price,
        OrderStatus::Pending,
    )
    .await?;

    let event_id = match publisher.publish(&order).await {
        Ok(event_id) => Some(event_id),
        Err(e) => {
            tracing::warn!(
                order_id = order.id,
                error = %e,
                "Order created but event publishing failed"
            );
            None
        }
    };

    Ok(CreatedOrder {
        order,
        customer,
        event_id,
    })
}
