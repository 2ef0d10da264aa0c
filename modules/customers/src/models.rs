use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Customer row owned by this service.
///
/// `orders_count` is mutated only by the order.created consumer, under a
/// row-level lock; nothing outside this service writes to it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub orders_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Customer representation exposed to other services
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub customer_name: String,
    pub address: String,
    pub orders_count: i32,
}

impl From<&Customer> for CustomerResponse {
    fn from(customer: &Customer) -> Self {
        Self {
            customer_name: customer.name.clone(),
            address: customer.address.clone(),
            orders_count: customer.orders_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
