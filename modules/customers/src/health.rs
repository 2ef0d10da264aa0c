use axum::{extract::State, http::StatusCode, Json};
use event_bus::EventBus;
use serde_json::Value;
use std::sync::Arc;

/// Health check endpoint handler
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "customer-rs",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Broker connectivity check, independent of the request path
pub async fn bus_health(State(bus): State<Arc<dyn EventBus>>) -> (StatusCode, Json<Value>) {
    if bus.is_connected() {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "bus": "connected" })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "error", "bus": "disconnected" })),
        )
    }
}
