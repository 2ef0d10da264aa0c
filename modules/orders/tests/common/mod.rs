use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to the integration-test database and run migrations.
///
/// Requires `DATABASE_URL` to point at a disposable Postgres instance.
pub async fn setup_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub async fn teardown_pool(pool: PgPool) {
    pool.close().await;
}
