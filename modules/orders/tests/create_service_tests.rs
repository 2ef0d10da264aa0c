//! Integration tests for the order creation orchestration.
//!
//! These exercise the real database path with the remote lookup and the bus
//! replaced by test doubles, so each failure mode can be forced in isolation.

mod common;

use async_trait::async_trait;
use event_bus::{BusError, BusMessage, BusResult, Delivery, EventBus, InMemoryBus};
use futures::stream::BoxStream;
use futures::StreamExt;
use serial_test::serial;
use std::sync::Arc;

use order_rs::clients::customer_client::{CustomerClientError, CustomerInfo, CustomerLookup};
use order_rs::events::publisher::OrderEventPublisher;
use order_rs::models::CreateOrderRequest;
use order_rs::services::create_service::{create_order, CreateOrderError};

/// Lookup double: `Some` verifies, `None` behaves like a 404 from the remote.
struct StubLookup {
    customer: Option<CustomerInfo>,
}

#[async_trait]
impl CustomerLookup for StubLookup {
    async fn fetch_customer(&self, _customer_id: i64) -> Result<CustomerInfo, CustomerClientError> {
        match &self.customer {
            Some(info) => Ok(info.clone()),
            None => Err(CustomerClientError::Api("Customer not found".to_string())),
        }
    }
}

fn verified_customer() -> StubLookup {
    StubLookup {
        customer: Some(CustomerInfo {
            customer_name: "María García".to_string(),
            address: "Calle Principal 123, CDMX".to_string(),
            orders_count: 0,
        }),
    }
}

/// Bus double simulating a broker outage.
struct FailingBus;

#[async_trait]
impl EventBus for FailingBus {
    async fn publish(&self, _subject: &str, _payload: Vec<u8>) -> BusResult<()> {
        Err(BusError::PublishError("broker unreachable".to_string()))
    }

    async fn publish_with_id(
        &self,
        _subject: &str,
        _msg_id: &str,
        _payload: Vec<u8>,
    ) -> BusResult<()> {
        Err(BusError::PublishError("broker unreachable".to_string()))
    }

    async fn subscribe(&self, _subject: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        Err(BusError::SubscribeError("broker unreachable".to_string()))
    }

    async fn subscribe_durable(
        &self,
        _stream: &str,
        _queue: &str,
        _subject: &str,
        _prefetch: usize,
    ) -> BusResult<BoxStream<'static, Delivery>> {
        Err(BusError::SubscribeError("broker unreachable".to_string()))
    }

    fn is_connected(&self) -> bool {
        false
    }
}

fn request(quantity: i32, price: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: 1,
        product_name: "Widget".to_string(),
        quantity,
        price: price.parse().unwrap(),
        status: None,
    }
}

async fn order_count(pool: &sqlx::PgPool) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
        .expect("Should count orders");
    row.0
}

#[tokio::test]
#[serial]
#[ignore] // Requires Postgres
async fn test_create_order_persists_and_publishes() {
    let pool = common::setup_pool().await;
    sqlx::query("DELETE FROM orders").execute(&pool).await.ok();

    let bus = Arc::new(InMemoryBus::new());
    let mut stream = bus.subscribe("orders.created").await.unwrap();
    let publisher = OrderEventPublisher::new(bus.clone());
    let lookup = verified_customer();

    let created = create_order(&pool, &lookup, &publisher, request(2, "149.99"))
        .await
        .expect("creation should succeed");

    assert_eq!(created.order.quantity, 2);
    assert_eq!(created.customer.customer_name, "María García");
    let event_id = created.event_id.expect("event id should be present");

    let msg = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
        .await
        .expect("timeout")
        .expect("stream ended");
    let event: serde_json::Value = serde_json::from_slice(&msg.payload).unwrap();

    assert_eq!(
        event.get("event_id").unwrap().as_str().unwrap(),
        event_id.to_string()
    );
    let total = event.pointer("/payload/total_amount").unwrap().as_f64().unwrap();
    assert!((total - 299.98).abs() < 1e-9);

    assert_eq!(order_count(&pool).await, 1);

    sqlx::query("DELETE FROM orders").execute(&pool).await.ok();
    common::teardown_pool(pool).await;
}

#[tokio::test]
#[serial]
#[ignore] // Requires Postgres
async fn test_unknown_customer_aborts_without_local_write() {
    let pool = common::setup_pool().await;
    sqlx::query("DELETE FROM orders").execute(&pool).await.ok();

    let publisher = OrderEventPublisher::new(Arc::new(InMemoryBus::new()));
    let lookup = StubLookup { customer: None };

    let err = create_order(&pool, &lookup, &publisher, request(1, "10.00"))
        .await
        .expect_err("creation should fail");

    assert!(matches!(err, CreateOrderError::CustomerLookup(_)));
    assert_eq!(err.messages(), vec!["Customer not found".to_string()]);
    assert_eq!(order_count(&pool).await, 0);

    common::teardown_pool(pool).await;
}

#[tokio::test]
#[serial]
#[ignore] // Requires Postgres
async fn test_validation_failure_reports_all_errors_and_writes_nothing() {
    let pool = common::setup_pool().await;
    sqlx::query("DELETE FROM orders").execute(&pool).await.ok();

    let publisher = OrderEventPublisher::new(Arc::new(InMemoryBus::new()));
    let lookup = verified_customer();

    let err = create_order(&pool, &lookup, &publisher, request(0, "0.00"))
        .await
        .expect_err("creation should fail");

    match &err {
        CreateOrderError::Validation(messages) => assert_eq!(messages.len(), 2),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(order_count(&pool).await, 0);

    common::teardown_pool(pool).await;
}

#[tokio::test]
#[serial]
#[ignore] // Requires Postgres
async fn test_publish_failure_still_creates_the_order() {
    let pool = common::setup_pool().await;
    sqlx::query("DELETE FROM orders").execute(&pool).await.ok();

    let publisher = OrderEventPublisher::new(Arc::new(FailingBus));
    let lookup = verified_customer();

    let created = create_order(&pool, &lookup, &publisher, request(1, "25.00"))
        .await
        .expect("creation should still succeed");

    // The local write survives a broker outage; only the event id is missing
    assert!(created.event_id.is_none());
    assert_eq!(order_count(&pool).await, 1);

    sqlx::query("DELETE FROM orders").execute(&pool).await.ok();
    common::teardown_pool(pool).await;
}
