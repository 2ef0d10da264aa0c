//! Contract tests for the retrying customer lookup client, run against a
//! local stub server so no live customer service is needed.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use order_rs::clients::customer_client::{
    CustomerClientError, CustomerLookup, HttpCustomerClient, RetryPolicy,
};

async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = listener.local_addr().expect("stub listener address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    addr
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(20),
        jitter: 0.5,
    }
}

#[tokio::test]
async fn test_fetch_customer_success() {
    let router = Router::new().route(
        "/api/v1/customers/{id}",
        get(|| async {
            Json(serde_json::json!({
                "customer_name": "María García",
                "address": "Calle Principal 123, CDMX",
                "orders_count": 4
            }))
        }),
    );
    let addr = spawn_stub(router).await;

    let client =
        HttpCustomerClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();

    let info = client.fetch_customer(1).await.expect("lookup should succeed");
    assert_eq!(info.customer_name, "María García");
    assert_eq!(info.orders_count, 4);
}

#[tokio::test]
async fn test_not_found_fails_after_exactly_one_attempt() {
    let hits = Arc::new(AtomicU32::new(0));
    let router = Router::new()
        .route(
            "/api/v1/customers/{id}",
            get(|State(hits): State<Arc<AtomicU32>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({ "error": "Customer not found" })),
                )
            }),
        )
        .with_state(hits.clone());
    let addr = spawn_stub(router).await;

    let client = HttpCustomerClient::with_retry_policy(
        format!("http://{addr}"),
        Duration::from_secs(2),
        fast_retry(),
    )
    .unwrap();

    let err = client
        .fetch_customer(999999)
        .await
        .expect_err("lookup should fail");

    assert!(matches!(err, CustomerClientError::Api(_)));
    assert_eq!(err.to_string(), "Customer not found");
    // Non-retryable: the retry budget must not be consumed
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_garbled_error_body_surfaces_unknown_error() {
    let router = Router::new().route(
        "/api/v1/customers/{id}",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "not json at all") }),
    );
    let addr = spawn_stub(router).await;

    let client =
        HttpCustomerClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();

    let err = client.fetch_customer(1).await.expect_err("lookup should fail");
    assert_eq!(err.to_string(), "Unknown error");
}

#[tokio::test]
async fn test_unreachable_service_retries_three_times_then_fails() {
    // Bind then immediately drop to obtain a port nothing is listening on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpCustomerClient::with_retry_policy(
        format!("http://{addr}"),
        Duration::from_secs(1),
        fast_retry(),
    )
    .unwrap();

    let start = Instant::now();
    let err = client.fetch_customer(1).await.expect_err("lookup should fail");
    let elapsed = start.elapsed();

    assert!(matches!(err, CustomerClientError::ConnectionFailed));
    assert!(err.to_string().contains("unavailable"));
    // Two backoffs happened: at least 20ms*0.5 + 40ms*0.5 even at minimum jitter
    assert!(elapsed >= Duration::from_millis(30), "elapsed: {elapsed:?}");
}
