use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Check if an event has already been applied (idempotency check)
pub async fn exists(pool: &PgPool, event_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM processed_events WHERE event_id = $1)",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(result)
}

/// Insert a processed event record within a transaction
///
/// Must run in the same transaction as the side effect it records: the row
/// exists if and only if the effect has been durably applied.
pub async fn insert(tx: &mut Transaction<'_, Postgres>, event_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO processed_events (event_id)
        VALUES ($1)
        "#,
    )
    .bind(event_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
