use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::clients::customer_client::CustomerLookup;
use crate::events::publisher::OrderEventPublisher;
use crate::models::{
    CreateOrderRequest, CreateOrderResponse, ErrorResponse, ErrorsResponse, OrderResponse,
};
use crate::repos::order_repo;
use crate::services::create_service::{create_order, CreateOrderError};

/// Shared state for the order routes
#[derive(Clone)]
pub struct OrdersState {
    pub pool: PgPool,
    pub lookup: Arc<dyn CustomerLookup>,
    pub publisher: OrderEventPublisher,
}

pub fn orders_router(state: OrdersState) -> Router {
    Router::new()
        .route("/api/v1/orders", post(create_order_handler).get(list_orders))
        .route("/api/v1/orders/{id}", get(get_order))
        .with_state(state)
}

/// POST /api/v1/orders - create an order
async fn create_order_handler(
    State(state): State<OrdersState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), (StatusCode, Json<ErrorsResponse>)> {
    match create_order(&state.pool, state.lookup.as_ref(), &state.publisher, req).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(CreateOrderResponse {
                order: OrderResponse::from(&created.order),
                customer: created.customer,
                event_id: created.event_id,
            }),
        )),
        Err(e @ CreateOrderError::Database(_)) => {
            tracing::error!(error = %e, "Failed to create order");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorsResponse {
                    errors: e.messages(),
                }),
            ))
        }
        Err(e) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorsResponse {
                errors: e.messages(),
            }),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct ListOrdersParams {
    customer_id: Option<i64>,
}

/// GET /api/v1/orders - list orders, optionally by customer
async fn list_orders(
    State(state): State<OrdersState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<OrderResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let orders = order_repo::list(&state.pool, params.customer_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list orders");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to list orders".to_string(),
                }),
            )
        })?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /api/v1/orders/{id} - fetch a single order
async fn get_order(
    State(state): State<OrdersState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let order = order_repo::find_by_id(&state.pool, id).await.map_err(|e| {
        tracing::error!(order_id = id, error = %e, "Failed to fetch order");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to fetch order".to_string(),
            }),
        )
    })?;

    match order {
        Some(order) => Ok(Json(OrderResponse::from(&order))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Order not found".to_string(),
            }),
        )),
    }
}
