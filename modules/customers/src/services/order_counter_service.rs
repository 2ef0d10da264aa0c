//! Applies order.created events to the customer store
//!
//! This service owns the only write path for `orders_count`. The dedup
//! check, the row lock, the increment, and the idempotency record share one
//! transaction boundary: either the counter moves and the event is recorded,
//! or neither happens. A crash before commit leaves no trace, so redelivery
//! reprocesses from scratch; a crash after commit is caught by the dedup
//! check on redelivery.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::repos::{customer_repo, processed_repo};

/// Errors that can occur while applying an order.created event
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The event was already applied; the expected common case on
    /// redelivery, not a defect.
    #[error("Event already processed (duplicate): {0}")]
    DuplicateEvent(Uuid),

    /// The referenced customer does not exist — a genuine data
    /// inconsistency that needs operator attention.
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Apply one order.created event: increment the customer's order count
/// exactly once, no matter how many times the event is delivered.
pub async fn process_order_created(
    pool: &PgPool,
    event_id: Uuid,
    customer_id: i64,
) -> Result<(), ApplyError> {
    // Cheap fast path on redelivery; no lock, no mutation
    if processed_repo::exists(pool, event_id).await? {
        return Err(ApplyError::DuplicateEvent(event_id));
    }

    let mut tx = pool.begin().await?;

    let customer = customer_repo::lock_by_id(&mut tx, customer_id)
        .await?
        .ok_or(ApplyError::CustomerNotFound(customer_id))?;

    let orders_count = customer_repo::increment_orders_count(&mut tx, customer.id).await?;
    processed_repo::insert(&mut tx, event_id).await?;

    // Dropping the transaction without commit rolls everything back
    tx.commit().await?;

    tracing::info!(
        event_id = %event_id,
        customer_id,
        orders_count,
        "Applied order.created event"
    );

    Ok(())
}
