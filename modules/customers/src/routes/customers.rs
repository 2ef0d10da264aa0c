use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use crate::models::{CustomerResponse, ErrorResponse};
use crate::repos::customer_repo;

pub fn customers_router(pool: PgPool) -> Router {
    Router::new()
        .route("/api/v1/customers/{id}", get(get_customer))
        .with_state(pool)
}

/// GET /api/v1/customers/{id} - the lookup contract consumed by the order
/// service's precondition check
async fn get_customer(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<CustomerResponse>, (StatusCode, Json<ErrorResponse>)> {
    let customer = customer_repo::find_by_id(&pool, id).await.map_err(|e| {
        tracing::error!(customer_id = id, error = %e, "Failed to fetch customer");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to fetch customer".to_string(),
            }),
        )
    })?;

    match customer {
        Some(customer) => Ok(Json(CustomerResponse::from(&customer))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Customer not found".to_string(),
            }),
        )),
    }
}
