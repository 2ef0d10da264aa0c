use axum::{routing::get, Router};
use event_bus::{ensure_stream, EventBus, InMemoryBus, NatsBus};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use order_rs::{
    clients::customer_client::HttpCustomerClient,
    config::Config,
    db,
    events::order_created::{ORDERS_STREAM, ORDER_CREATED_ROUTING_KEY},
    events::publisher::OrderEventPublisher,
    health::{bus_health, health},
    routes::orders::{orders_router, OrdersState},
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting order service...");

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        "Configuration loaded: host={}, port={}, bus_type={}",
        config.host,
        config.port,
        config.bus_type
    );

    // Database connection
    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Create event bus; connection handles are owned here and injected below
    let bus: Arc<dyn EventBus> = match config.bus_type.to_lowercase().as_str() {
        "inmemory" => {
            tracing::info!("Using InMemory event bus");
            Arc::new(InMemoryBus::new())
        }
        "nats" => {
            tracing::info!("Connecting to NATS at {}", config.nats_url);
            let client = async_nats::connect(&config.nats_url)
                .await
                .expect("Failed to connect to NATS");
            ensure_stream(
                client.clone(),
                ORDERS_STREAM,
                vec![ORDER_CREATED_ROUTING_KEY.to_string()],
            )
            .await
            .expect("Failed to provision event stream");
            Arc::new(NatsBus::new(client))
        }
        _ => panic!(
            "Invalid BUS_TYPE: {}. Must be 'inmemory' or 'nats'",
            config.bus_type
        ),
    };

    let customer_client = HttpCustomerClient::new(
        config.customer_service_url.clone(),
        Duration::from_secs(config.customer_timeout_secs),
    )
    .expect("Failed to build customer client");

    let state = OrdersState {
        pool: pool.clone(),
        lookup: Arc::new(customer_client),
        publisher: OrderEventPublisher::new(bus.clone()),
    };

    // Build the application router
    let app = orders_router(state)
        .merge(
            Router::new()
                .route("/api/health", get(health))
                .route("/api/health/bus", get(bus_health))
                .with_state(bus.clone()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    // Bind to the configured address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Order service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    // Start the server
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
