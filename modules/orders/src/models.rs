use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::clients::customer_client::CustomerInfo;

/// Order lifecycle status. Orders are always created `pending`; later
/// transitions happen through dedicated state-change operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

/// Order row owned by this service. The customer reference is validated
/// remotely at creation time, not enforced locally.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Computed order total: price × quantity, at 2-decimal money precision.
    pub fn total_amount(&self) -> Decimal {
        (self.price * Decimal::from(self.quantity)).round_dp(2)
    }
}

/// Order-creation parameters accepted by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Order representation returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
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

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            product_name: order.product_name.clone(),
            quantity: order.quantity,
            price: order.price,
            status: order.status,
            total_amount: order.total_amount(),
            created_at: order.created_at,
        }
    }
}

/// Successful creation response: the persisted order, the customer info
/// obtained during the precondition check, and the published event id when
/// publishing succeeded.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: OrderResponse,
    pub customer: CustomerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorsResponse {
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with(price: &str, quantity: i32) -> Order {
        Order {
            id: 1,
            customer_id: 1,
            product_name: "Widget".to_string(),
            quantity,
            price: price.parse().unwrap(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_amount_is_price_times_quantity() {
        let order = order_with("149.99", 2);
        assert_eq!(order.total_amount(), "299.98".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_total_amount_rounds_to_money_precision() {
        let order = order_with("0.10", 3);
        assert_eq!(order.total_amount(), "0.30".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_order_serializes_price_as_number() {
        let order = order_with("19.50", 1);
        let value = serde_json::to_value(&order).unwrap();
        assert!(value.get("price").unwrap().is_number());
        assert_eq!(value.get("status").unwrap(), "pending");
    }
}
