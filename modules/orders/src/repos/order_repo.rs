use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::{Order, OrderStatus};

/// Insert a new order and return the persisted row
pub async fn insert(
    pool: &PgPool,
    customer_id: i64,
    product_name: &str,
    quantity: i32,
    price: Decimal,
    status: OrderStatus,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (customer_id, product_name, quantity, price, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, customer_id, product_name, quantity, price, status, created_at
        "#,
    )
    .bind(customer_id)
    .bind(product_name)
    .bind(quantity)
    .bind(price)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(order)
}

/// Find an order by id, None if absent
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, customer_id, product_name, quantity, price, status, created_at
        FROM orders
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// List orders, optionally filtered by customer, newest first
pub async fn list(pool: &PgPool, customer_id: Option<i64>) -> Result<Vec<Order>, sqlx::Error> {
    let orders = match customer_id {
        Some(customer_id) => {
            sqlx::query_as::<_, Order>(
                r#"
                SELECT id, customer_id, product_name, quantity, price, status, created_at
                FROM orders
                WHERE customer_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(customer_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Order>(
                r#"
                SELECT id, customer_id, product_name, quantity, price, status, created_at
                FROM orders
                ORDER BY created_at DESC
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(orders)
}
