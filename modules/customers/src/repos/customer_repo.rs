use sqlx::{PgPool, Postgres, Transaction};

use crate::models::Customer;

/// Find a customer by id, None if absent
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, email, address, orders_count, created_at
        FROM customers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(customer)
}

/// Lock a customer row exclusively within a transaction.
///
/// Blocks until the lock is granted; concurrent appliers for the same
/// customer serialize here, which is the sole mechanism against lost
/// counter updates. Rows for different customers never contend.
pub async fn lock_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, email, address, orders_count, created_at
        FROM customers
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(customer)
}

/// Increment a customer's order count within a transaction, returning the
/// new count. Callers must hold the row lock.
pub async fn increment_orders_count(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<i32, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i32>(
        r#"
        UPDATE customers
        SET orders_count = orders_count + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING orders_count
        "#,
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(count)
}

/// Insert a customer unless the email is already taken (seeding helper)
pub async fn insert_if_absent(
    pool: &PgPool,
    name: &str,
    email: &str,
    address: &str,
) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (name, email, address)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id, name, email, address, orders_count, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(address)
    .fetch_optional(pool)
    .await?;

    Ok(customer)
}
